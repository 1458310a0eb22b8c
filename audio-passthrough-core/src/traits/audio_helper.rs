use crate::models::audio_models::ProcessId;
use crate::models::error::SessionError;
use crate::models::state::CaptureStatus;

/// Reply continuation handed over with every request.
///
/// `FnOnce` makes "invoked at most once" a type-level guarantee; implementors
/// guarantee "at least once" on every path, including internal failures.
pub type Reply<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// The privileged capture service contract.
///
/// Mirrors the helper's remote interface: each operation takes a reply
/// continuation instead of returning. No ordering is promised between
/// independent requests; consistency comes from the session state machine.
pub trait AudioHelper: Send + Sync {
    /// Helper version. Callable in any state, no side effects.
    fn get_version(&self, reply: Reply<String>);

    /// Start capturing the audio output of `pid`.
    fn start_capture(&self, pid: ProcessId, reply: Reply<Result<(), SessionError>>);

    /// Stop the active (or failed) session. No-op success when idle.
    fn stop_capture(&self, reply: Reply<Result<(), SessionError>>);

    /// Current `(is_capturing, device_name)`.
    fn get_capture_status(&self, reply: Reply<CaptureStatus>);
}
