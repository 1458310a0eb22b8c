//! Loop-free forwarding of virtual-device frames to a physical output.

pub mod context;
pub mod loop_guard;
pub mod monitor;
pub mod passthrough;
