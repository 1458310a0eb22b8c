use std::sync::Arc;

use crate::models::audio_models::ProcessId;
use crate::models::error::AttachError;

/// An attachment to one process's audio output.
pub trait ProcessTap: Send {
    /// Name of the device the tap resolved to.
    fn device_name(&self) -> &str;

    /// Detach and release every resource held by the tap.
    fn release(&mut self);
}

/// Capability to attach to the audio produced by a running process.
///
/// Implemented by platform backends (Core Audio process taps, WASAPI process
/// loopback). `attach` may block while the OS resolves the process.
pub trait ProcessAttacher: Send + Sync {
    type Tap: ProcessTap;

    fn attach(&self, pid: ProcessId) -> Result<Self::Tap, AttachError>;
}

impl<T: ProcessAttacher + ?Sized> ProcessAttacher for Arc<T> {
    type Tap = T::Tap;

    fn attach(&self, pid: ProcessId) -> Result<Self::Tap, AttachError> {
        (**self).attach(pid)
    }
}
