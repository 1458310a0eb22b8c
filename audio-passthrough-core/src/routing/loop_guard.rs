use crate::models::audio_models::{DeviceDescriptor, DeviceId, RoutingCounters};
use crate::routing::context::RoutingContext;
use crate::traits::device_catalog::DeviceCatalog;
use crate::traits::output_backend::OutputBackend;

/// Device ids above this value are presumed driver-assigned, i.e. the
/// virtual device itself.
pub const SELF_DEVICE_ID_THRESHOLD: u32 = 100;

/// Whether `id` is presumed to be the virtual device itself.
///
/// An id heuristic, not an identity check: hardware ids on some systems may
/// exceed the threshold. Every self-classification goes through here so the
/// heuristic can be swapped for a real identity test in one place.
pub fn is_self_device(id: DeviceId) -> bool {
    id.get() > SELF_DEVICE_ID_THRESHOLD
}

/// Result of one loop guard pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Nothing is bound, nothing to guard.
    Idle,
    /// The bound target is a physical device.
    Clear,
    /// The target was the virtual device and now points at this device.
    Repointed(DeviceId),
    /// The target is the virtual device and no physical output could be bound.
    NoAlternative,
}

/// Keeps the routing context from forwarding into the virtual device.
pub struct LoopGuard<C: DeviceCatalog> {
    catalog: C,
}

impl<C: DeviceCatalog> LoopGuard<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Bind the system default output, or the first physical output if the
    /// default is the virtual device, cannot be resolved, or refuses the bind.
    pub fn bind_default_output<B: OutputBackend>(&self, routing: &RoutingContext<B>) -> Option<DeviceDescriptor> {
        let skip = match self.catalog.default_output_device() {
            Ok(default) if !is_self_device(default.id) => match routing.initialize(&default) {
                Ok(()) => return Some(default),
                Err(e) => {
                    log::warn!("Default output refused, looking for another physical output: {}", e);
                    Some(default.id)
                }
            },
            Ok(default) => {
                log::info!("Default output {} is the virtual device, looking for a physical output", default);
                Some(default.id)
            }
            Err(e) => {
                log::warn!("Default output unavailable ({}), looking for a physical output", e);
                None
            }
        };

        self.bind_physical_output(routing, skip)
    }

    /// Re-evaluate the routing target once.
    ///
    /// If the target classifies as self, the catalog is enumerated and the
    /// first other device with output streams is bound in its place.
    pub fn run_cycle<B: OutputBackend>(&self, routing: &RoutingContext<B>) -> GuardOutcome {
        let Some(current) = routing.target_id() else {
            return GuardOutcome::Idle;
        };
        if !is_self_device(current) {
            return GuardOutcome::Clear;
        }

        match self.bind_physical_output(routing, Some(current)) {
            Some(device) => GuardOutcome::Repointed(device.id),
            None => GuardOutcome::NoAlternative,
        }
    }

    /// Bind the first device, other than `skip`, that is not classified as
    /// self and reports output streams.
    ///
    /// Enumeration failure counts as "no alternative". A candidate that
    /// refuses the bind is skipped in favour of the next one.
    pub fn bind_physical_output<B: OutputBackend>(
        &self,
        routing: &RoutingContext<B>,
        skip: Option<DeviceId>,
    ) -> Option<DeviceDescriptor> {
        let devices = match self.catalog.list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("Device enumeration failed, no alternative output: {}", e);
                return None;
            }
        };

        let candidates = devices
            .into_iter()
            .filter(|d| Some(d.id) != skip && !is_self_device(d.id));

        for candidate in candidates {
            if !self.catalog.has_output_streams(candidate.id) {
                continue;
            }
            match routing.initialize(&candidate) {
                Ok(()) => {
                    RoutingCounters::bump(&routing.counters().repoints, 1);
                    log::info!("Loop guard repointed output to {}", candidate);
                    return Some(candidate);
                }
                Err(e) => log::warn!("Skipping output candidate {}: {}", candidate, e),
            }
        }

        log::debug!("No physical output device available");
        None
    }
}
