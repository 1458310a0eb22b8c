//! # audio-passthrough-core
//!
//! Platform-agnostic core of the virtual output device and its privileged
//! capture helper.
//!
//! Provides loop-free routing of frames received on the virtual device to a
//! real physical output, and the lifecycle of a single process-capture
//! session. Platform backends implement the collaborator traits
//! (`DeviceCatalog`, `OutputBackend`, `ProcessAttacher`) and plug into the
//! generic `Passthrough` and `CaptureSessionManager`.
//!
//! ## Architecture
//!
//! ```text
//! audio-passthrough-core (this crate)
//! ├── traits/       ← DeviceCatalog, OutputBackend, ProcessAttacher, SessionObserver, AudioHelper
//! ├── models/       ← AudioFormat, DeviceDescriptor, errors, CaptureState, configuration
//! ├── processing/   ← FrameBuffer
//! ├── routing/      ← RoutingContext, LoopGuard, GuardMonitor, Passthrough
//! └── session/      ← CaptureSessionManager, CaptureService
//! ```

pub mod models;
pub mod processing;
pub mod routing;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioFormat, DeviceClass, DeviceDescriptor, DeviceId, ProcessId, RoutingDiagnostics};
pub use models::config::PassthroughConfiguration;
pub use models::error::{AttachError, DeviceError, RoutingError, SessionError};
pub use models::state::{CaptureState, CaptureStatus};
pub use processing::frame_buffer::FrameBuffer;
pub use routing::context::RoutingContext;
pub use routing::loop_guard::{is_self_device, GuardOutcome, LoopGuard, SELF_DEVICE_ID_THRESHOLD};
pub use routing::monitor::GuardMonitor;
pub use routing::passthrough::{DeliveryStatus, Passthrough};
pub use session::manager::{CaptureSessionManager, SessionRecord};
pub use session::service::CaptureService;
pub use session::HELPER_VERSION;
pub use traits::audio_helper::{AudioHelper, Reply};
pub use traits::device_catalog::DeviceCatalog;
pub use traits::output_backend::{OutputBackend, OutputHandle};
pub use traits::process_attacher::{ProcessAttacher, ProcessTap};
pub use traits::session_observer::SessionObserver;
