use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use audio_passthrough_core::{CaptureStatus, ProcessId};

use crate::config::HelperConfiguration;
use crate::error::HelperError;
use crate::protocol::{self, Request, Response};

/// Blocking client for the helper socket.
///
/// One request in flight at a time; every call waits at most the configured
/// reply timeout.
pub struct HelperClient {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
    timeout: Duration,
}

impl HelperClient {
    pub fn connect(config: &HelperConfiguration) -> Result<Self, HelperError> {
        config.validate().map_err(HelperError::Configuration)?;
        Self::connect_to(&config.socket_path, config.reply_timeout)
    }

    pub fn connect_to(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, HelperError> {
        let stream = UnixStream::connect(path.as_ref())?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let writer = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            timeout,
        })
    }

    /// Send one request and wait for its response line.
    pub fn request(&mut self, request: &Request) -> Result<Response, HelperError> {
        let timeout = self.timeout;
        let line = protocol::encode_line(request)?;
        self.writer
            .write_all(line.as_bytes())
            .map_err(|e| io_error(e, timeout))?;

        let mut reply = String::new();
        let read = self
            .reader
            .read_line(&mut reply)
            .map_err(|e| io_error(e, timeout))?;
        if read == 0 {
            return Err(HelperError::Protocol("helper closed the connection".into()));
        }
        protocol::decode_response(&reply)
    }

    pub fn get_version(&mut self) -> Result<String, HelperError> {
        match self.request(&Request::GetVersion)? {
            Response::Version { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Fail with `VersionMismatch` unless the helper reports `expected`.
    pub fn check_version(&mut self, expected: &str) -> Result<(), HelperError> {
        let actual = self.get_version()?;
        if actual != expected {
            return Err(HelperError::VersionMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    pub fn start_capture(&mut self, pid: ProcessId) -> Result<(), HelperError> {
        status(self.request(&Request::StartCapture { pid })?)
    }

    pub fn stop_capture(&mut self) -> Result<(), HelperError> {
        status(self.request(&Request::StopCapture)?)
    }

    pub fn get_capture_status(&mut self) -> Result<CaptureStatus, HelperError> {
        match self.request(&Request::GetCaptureStatus)? {
            Response::CaptureStatus {
                is_capturing,
                device_name,
            } => Ok(CaptureStatus {
                is_capturing,
                device_name,
            }),
            other => Err(unexpected(other)),
        }
    }
}

fn io_error(err: io::Error, timeout: Duration) -> HelperError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => HelperError::Timeout(timeout),
        _ => HelperError::Io(err),
    }
}

fn status(response: Response) -> Result<(), HelperError> {
    match response {
        Response::Status { success: true, .. } => Ok(()),
        Response::Status { success: false, error } => Err(HelperError::Remote(
            error.unwrap_or_else(|| "request failed".into()),
        )),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: Response) -> HelperError {
    match response {
        Response::Error { message } => HelperError::Remote(message),
        other => HelperError::Protocol(format!("unexpected response: {:?}", other)),
    }
}
