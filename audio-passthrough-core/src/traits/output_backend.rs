use std::sync::Arc;

use crate::models::audio_models::{AudioFormat, DeviceDescriptor};
use crate::models::error::DeviceError;

/// A live, started output stream bound to one device.
pub trait OutputHandle: Send {
    /// Queue interleaved samples for playback.
    ///
    /// Called on the frame path with the routing lock held. Must not block
    /// for unbounded time.
    fn enqueue(&mut self, samples: &[f32]) -> Result<(), DeviceError>;

    /// Stop playback and release the hardware stream.
    fn stop(&mut self);
}

/// Capability to bind an output stream to a physical device.
pub trait OutputBackend: Send + Sync {
    type Handle: OutputHandle;

    /// Open and start an output stream on `device` with `format`.
    ///
    /// Fails if the hardware refuses the device or the format.
    fn open(&self, device: &DeviceDescriptor, format: &AudioFormat) -> Result<Self::Handle, DeviceError>;
}

impl<T: OutputBackend + ?Sized> OutputBackend for Arc<T> {
    type Handle = T::Handle;

    fn open(&self, device: &DeviceDescriptor, format: &AudioFormat) -> Result<Self::Handle, DeviceError> {
        (**self).open(device, format)
    }
}
