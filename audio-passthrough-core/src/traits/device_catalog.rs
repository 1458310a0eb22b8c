use std::sync::Arc;

use crate::models::audio_models::{DeviceDescriptor, DeviceId};
use crate::models::error::DeviceError;

/// Device enumeration capability consumed by the loop guard.
///
/// Implemented by platform backends (Core Audio HAL, WASAPI, PipeWire).
/// Every call reflects the topology at call time; nothing is cached.
pub trait DeviceCatalog: Send + Sync {
    /// All devices currently known to the system.
    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError>;

    /// Whether the device exposes at least one output stream.
    ///
    /// Query failures count as "no output streams".
    fn has_output_streams(&self, id: DeviceId) -> bool;

    /// The device the system currently routes its default output to.
    fn default_output_device(&self) -> Result<DeviceDescriptor, DeviceError>;
}

impl<T: DeviceCatalog + ?Sized> DeviceCatalog for Arc<T> {
    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        (**self).list_devices()
    }

    fn has_output_streams(&self, id: DeviceId) -> bool {
        (**self).has_output_streams(id)
    }

    fn default_output_device(&self) -> Result<DeviceDescriptor, DeviceError> {
        (**self).default_output_device()
    }
}
