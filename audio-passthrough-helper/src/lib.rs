//! # audio-passthrough-helper
//!
//! Out-of-process host for capture sessions. Serves the `AudioHelper`
//! contract over a local Unix domain socket using newline-delimited JSON,
//! and provides the matching client.
//!
//! ```text
//! HelperClient ──json line──→ HelperServer ──Reply<T>──→ CaptureService
//!              ←─json line───              ←────────────  └→ CaptureSessionManager
//! ```

pub mod config;
pub mod error;
pub mod observer;
pub mod protocol;

#[cfg(unix)]
pub mod client;
#[cfg(unix)]
pub mod process_probe;
#[cfg(unix)]
pub mod server;

pub use config::HelperConfiguration;
pub use error::HelperError;
pub use observer::LogObserver;
pub use protocol::{Request, Response};

#[cfg(unix)]
pub use client::HelperClient;
#[cfg(unix)]
pub use process_probe::ProcessProbeAttacher;
#[cfg(unix)]
pub use server::{HelperServer, ServerHandle};
