use thiserror::Error;

use super::audio_models::{DeviceId, ProcessId};

/// Errors surfaced by the routing context and the passthrough entry point.
///
/// None of these are fatal; the frame path maps them to a status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("device {device} refused binding: {reason}")]
    DeviceBind { device: DeviceId, reason: String },

    #[error("routing not initialized")]
    NotInitialized,

    #[error("buffer overflow: {requested_bytes} bytes requested, capacity is {capacity_bytes}")]
    BufferOverflow {
        requested_bytes: usize,
        capacity_bytes: usize,
    },

    #[error("invalid buffer: expected {expected} samples, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    #[error("routing context busy")]
    Busy,

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("no physical output device available")]
    NoOutputDevice,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors returned by capture session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("capture session already active")]
    AlreadyActive,

    #[error("capture session busy")]
    Busy,

    #[error("capture session failed; stop it before starting again")]
    NeedsReset,

    #[error("invalid process id: {0}")]
    InvalidProcess(ProcessId),

    #[error("capture attach failed: {0}")]
    CaptureAttach(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures reported by device collaborators (catalog and output backend).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device not available")]
    Unavailable,

    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    #[error("device refused request: {0}")]
    Refused(String),
}

/// Failures reported when attaching to a process's audio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),

    #[error("permission denied")]
    PermissionDenied,

    #[error("attach refused: {0}")]
    Refused(String),
}

impl From<AttachError> for SessionError {
    fn from(err: AttachError) -> Self {
        Self::CaptureAttach(err.to_string())
    }
}
