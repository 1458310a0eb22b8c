use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::routing::loop_guard::is_self_device;

/// Operating-system process identifier targeted by a capture session.
pub type ProcessId = i32;

const SAMPLE_RATE: u32 = 48_000;
const CHANNELS: u16 = 2;
const BYTES_PER_SAMPLE: usize = std::mem::size_of::<f32>();

/// The one audio format exchanged with hardware.
///
/// 48 kHz, 2 channels, packed interleaved 32-bit float. Not configurable:
/// every buffer handed to an output handle must match it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
}

impl AudioFormat {
    pub const fn stereo_f32() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        (BYTES_PER_SAMPLE * 8) as u16
    }

    /// `channels × sample width`, 8 bytes for the fixed format.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Number of interleaved samples making up `frame_count` frames.
    pub fn samples_for(&self, frame_count: usize) -> usize {
        frame_count.saturating_mul(self.channels as usize)
    }

    pub fn bytes_for(&self, frame_count: usize) -> usize {
        frame_count.saturating_mul(self.bytes_per_frame())
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::stereo_f32()
    }
}

/// Platform-scoped device handle. Not stable across reboots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a device is (presumed to be) the virtual device itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Virtual,
    Physical,
}

/// An audio device as reported by one enumeration call.
///
/// Built fresh on every enumeration; topology can change between calls, so
/// descriptors are not kept beyond a single routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub name: String,
    pub has_output: bool,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, has_output: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            has_output,
        }
    }

    pub fn class(&self) -> DeviceClass {
        if is_self_device(self.id) {
            DeviceClass::Virtual
        } else {
            DeviceClass::Physical
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Counters for the frame path. Atomics so the busy path never takes a lock.
#[derive(Debug, Default)]
pub(crate) struct RoutingCounters {
    pub frames_delivered: AtomicU64,
    pub buffer_overflows: AtomicU64,
    pub busy_rejections: AtomicU64,
    pub suppressed: AtomicU64,
    pub not_initialized: AtomicU64,
    pub repoints: AtomicU64,
}

impl RoutingCounters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RoutingDiagnostics {
        RoutingDiagnostics {
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            buffer_overflows: self.buffer_overflows.load(Ordering::Relaxed),
            busy_rejections: self.busy_rejections.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            not_initialized: self.not_initialized.load(Ordering::Relaxed),
            repoints: self.repoints.load(Ordering::Relaxed),
        }
    }
}

/// Diagnostics for debugging the passthrough path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingDiagnostics {
    pub frames_delivered: u64,
    pub buffer_overflows: u64,
    pub busy_rejections: u64,
    pub suppressed: u64,
    pub not_initialized: u64,
    pub repoints: u64,
}
