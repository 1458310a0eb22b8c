use crate::models::error::SessionError;
use crate::models::state::CaptureState;

/// Event observer for capture session notifications.
///
/// Called from whichever thread performed the transition, after the session
/// lock has been released. Implementations may call back into the manager.
pub trait SessionObserver: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when a start attempt fails to attach.
    fn on_error(&self, _error: &SessionError) {}
}
