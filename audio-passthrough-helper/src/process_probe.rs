use std::io;

use audio_passthrough_core::{AttachError, ProcessAttacher, ProcessId, ProcessTap};

/// Attacher that verifies the target process exists and may be signalled.
///
/// Binds a placeholder tap named after the pid. Platforms with a real
/// process-audio API supply their own `ProcessAttacher`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessProbeAttacher;

#[derive(Debug)]
pub struct ProbeTap {
    pid: ProcessId,
    device_name: String,
    released: bool,
}

impl ProcessTap for ProbeTap {
    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            log::debug!("Released tap on process {}", self.pid);
        }
    }
}

impl ProcessAttacher for ProcessProbeAttacher {
    type Tap = ProbeTap;

    fn attach(&self, pid: ProcessId) -> Result<ProbeTap, AttachError> {
        // kill() treats 0 and negative pids as process groups.
        if pid <= 0 {
            return Err(AttachError::ProcessNotFound(pid));
        }

        // SAFETY: signal 0 performs only the existence and permission check.
        let rc = unsafe { libc::kill(pid, 0) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::ESRCH) => AttachError::ProcessNotFound(pid),
                Some(libc::EPERM) => AttachError::PermissionDenied,
                _ => AttachError::Refused(err.to_string()),
            });
        }

        Ok(ProbeTap {
            pid,
            device_name: format!("process-tap:{pid}"),
            released: false,
        })
    }
}
