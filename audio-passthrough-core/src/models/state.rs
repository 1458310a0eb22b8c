use serde::{Deserialize, Serialize};

use super::audio_models::ProcessId;
use super::error::SessionError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → capturing → stopping → idle
///            ↓          ↓           ↑
///            └──→ failed ───────────┘   (failed is left only via stop)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting { pid: ProcessId },
    Capturing { pid: ProcessId, device_name: String },
    Stopping,
    Failed(SessionError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// A transition is in flight; other requests must wait or back off.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Starting { .. } | Self::Stopping)
    }

    /// Bound device name, present only while capturing.
    pub fn device_name(&self) -> Option<&str> {
        match self {
            Self::Capturing { device_name, .. } => Some(device_name),
            _ => None,
        }
    }

    pub fn pid(&self) -> Option<ProcessId> {
        match self {
            Self::Starting { pid } | Self::Capturing { pid, .. } => Some(*pid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting { .. } => "starting",
            Self::Capturing { .. } => "capturing",
            Self::Stopping => "stopping",
            Self::Failed(_) => "failed",
        }
    }
}

/// Reply payload of `getCaptureStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub is_capturing: bool,
    pub device_name: Option<String>,
}

impl From<&CaptureState> for CaptureStatus {
    fn from(state: &CaptureState) -> Self {
        Self {
            is_capturing: state.is_capturing(),
            device_name: state.device_name().map(str::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_name_only_while_capturing() {
        let capturing = CaptureState::Capturing {
            pid: 1234,
            device_name: "process-tap:1234".into(),
        };
        assert_eq!(capturing.device_name(), Some("process-tap:1234"));
        assert_eq!(CaptureState::Starting { pid: 1234 }.device_name(), None);
        assert_eq!(CaptureState::Idle.device_name(), None);
    }

    #[test]
    fn status_reflects_state() {
        let status = CaptureStatus::from(&CaptureState::Failed(SessionError::AlreadyActive));
        assert_eq!(
            status,
            CaptureStatus {
                is_capturing: false,
                device_name: None
            }
        );
    }

    #[test]
    fn transitioning_states() {
        assert!(CaptureState::Starting { pid: 7 }.is_transitioning());
        assert!(CaptureState::Stopping.is_transitioning());
        assert!(!CaptureState::Idle.is_transitioning());
        assert!(!CaptureState::Failed(SessionError::Busy).is_transitioning());
    }
}
