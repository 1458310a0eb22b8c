use audio_passthrough_core::{CaptureState, SessionError, SessionObserver};

/// Writes session transitions to the log.
#[derive(Debug, Default)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_state_changed(&self, state: &CaptureState) {
        match state {
            CaptureState::Capturing { pid, device_name } => {
                log::info!("Capturing process {} via {}", pid, device_name)
            }
            CaptureState::Failed(err) => log::warn!("Capture session failed: {}", err),
            other => log::debug!("Capture session {}", other.name()),
        }
    }

    fn on_error(&self, error: &SessionError) {
        log::error!("Capture error: {}", error);
    }
}
