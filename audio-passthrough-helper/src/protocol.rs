//! Wire format of the helper socket.
//!
//! One JSON object per line in each direction, one response line per request
//! line. Messages are internally tagged by `"type"`.

use audio_passthrough_core::{CaptureStatus, ProcessId, SessionError};
use serde::{Deserialize, Serialize};

use crate::error::HelperError;

/// Request from client to helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    GetVersion,
    StartCapture { pid: ProcessId },
    StopCapture,
    GetCaptureStatus,
}

/// Response from helper to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Version {
        version: String,
    },
    /// Outcome of start or stop.
    Status {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    CaptureStatus {
        is_capturing: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        device_name: Option<String>,
    },
    /// The request could not be decoded or was not answered.
    Error {
        message: String,
    },
}

impl Response {
    pub fn from_result(result: Result<(), SessionError>) -> Self {
        match result {
            Ok(()) => Self::Status {
                success: true,
                error: None,
            },
            Err(e) => Self::Status {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<CaptureStatus> for Response {
    fn from(status: CaptureStatus) -> Self {
        Self::CaptureStatus {
            is_capturing: status.is_capturing,
            device_name: status.device_name,
        }
    }
}

/// Serialize `message` as a single newline-terminated line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, HelperError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_request(line: &str) -> Result<Request, HelperError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

pub fn decode_response(line: &str) -> Result<Response, HelperError> {
    Ok(serde_json::from_str(line.trim_end())?)
}
