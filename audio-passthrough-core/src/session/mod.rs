//! Process capture session lifecycle and its reply-continuation service.

pub mod manager;
pub mod service;

/// Version reported by `getVersion` across the helper boundary.
pub const HELPER_VERSION: &str = env!("CARGO_PKG_VERSION");
