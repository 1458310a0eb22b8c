use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::audio_models::{DeviceDescriptor, RoutingCounters, RoutingDiagnostics};
use crate::models::config::PassthroughConfiguration;
use crate::models::error::RoutingError;
use crate::routing::context::RoutingContext;
use crate::routing::loop_guard::{is_self_device, GuardOutcome, LoopGuard};
use crate::traits::device_catalog::DeviceCatalog;
use crate::traits::output_backend::OutputBackend;

/// Outcome of one frame delivery, as reported to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// Nothing forwarded on purpose (target is the virtual device itself,
    /// or routing is not bound in a release build).
    Suppressed,
    /// Passthrough switched off.
    Disabled,
    /// Routing not bound. Only reported by debug builds.
    NotInitialized,
    BufferOverflow,
    Busy,
    InvalidBuffer,
    PlaybackFailed,
}

impl DeliveryStatus {
    /// Status code for a C-style driver boundary. Negative means failure.
    pub fn as_code(self) -> i32 {
        match self {
            Self::Delivered => 0,
            Self::Suppressed => 1,
            Self::Disabled => 2,
            Self::NotInitialized => -1,
            Self::BufferOverflow => -2,
            Self::Busy => -3,
            Self::InvalidBuffer => -4,
            Self::PlaybackFailed => -5,
        }
    }

    pub fn is_success(self) -> bool {
        self.as_code() >= 0
    }
}

impl From<RoutingError> for DeliveryStatus {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::NotInitialized if cfg!(debug_assertions) => Self::NotInitialized,
            RoutingError::NotInitialized => Self::Suppressed,
            RoutingError::BufferOverflow { .. } => Self::BufferOverflow,
            RoutingError::Busy => Self::Busy,
            RoutingError::InvalidBuffer { .. } => Self::InvalidBuffer,
            RoutingError::Playback(_)
            | RoutingError::DeviceBind { .. }
            | RoutingError::NoOutputDevice
            | RoutingError::InvalidConfiguration(_) => Self::PlaybackFailed,
        }
    }
}

/// Frame-delivery entry point of the virtual device.
///
/// Owns the routing context and the loop guard that keeps it pointed at a
/// physical output. Created when the device starts, dropped when it stops;
/// the driver holds it (usually in an `Arc`) and calls `deliver` from its
/// IO callback.
pub struct Passthrough<C: DeviceCatalog, B: OutputBackend> {
    routing: RoutingContext<B>,
    guard: LoopGuard<C>,
    enabled: AtomicBool,
    config: PassthroughConfiguration,
}

impl<C: DeviceCatalog, B: OutputBackend> Passthrough<C, B> {
    pub fn new(catalog: C, backend: B, config: PassthroughConfiguration) -> Result<Self, RoutingError> {
        config.validate().map_err(RoutingError::InvalidConfiguration)?;

        Ok(Self {
            routing: RoutingContext::new(backend, config.initial_buffer_frames),
            guard: LoopGuard::new(catalog),
            enabled: AtomicBool::new(config.enabled),
            config,
        })
    }

    /// Bind routing to the system default output.
    ///
    /// Falls back to the first physical output from the catalog when the
    /// default is the virtual device itself, cannot be resolved, or refuses
    /// the bind.
    pub fn start(&self) -> Result<DeviceDescriptor, RoutingError> {
        self.guard
            .bind_default_output(&self.routing)
            .ok_or(RoutingError::NoOutputDevice)
    }

    /// Release the output. Safe to call repeatedly.
    pub fn stop(&self) {
        self.routing.shutdown();
    }

    /// Forward `frame_count` interleaved stereo frames to the physical output.
    ///
    /// Bounded-time and panic-free: never waits on reconfiguration, never
    /// enumerates devices, never logs. Errors become status values.
    pub fn deliver(&self, samples: &[f32], frame_count: usize) -> DeliveryStatus {
        if !self.enabled.load(Ordering::Relaxed) {
            return DeliveryStatus::Disabled;
        }

        if self.routing.target_id().is_some_and(is_self_device) {
            RoutingCounters::bump(&self.routing.counters().suppressed, 1);
            return DeliveryStatus::Suppressed;
        }

        match self.routing.send_frames(samples, frame_count) {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => DeliveryStatus::from(e),
        }
    }

    /// Run one loop guard pass against the routing context.
    pub fn run_guard_cycle(&self) -> GuardOutcome {
        self.guard.run_cycle(&self.routing)
    }

    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            log::info!("Passthrough {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn routing(&self) -> &RoutingContext<B> {
        &self.routing
    }

    pub fn config(&self) -> &PassthroughConfiguration {
        &self.config
    }

    pub fn diagnostics(&self) -> RoutingDiagnostics {
        self.routing.diagnostics()
    }
}
