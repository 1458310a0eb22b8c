//! In-memory collaborators for unit tests.
//!
//! Stand in for the platform backends without touching audio hardware.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::models::audio_models::{AudioFormat, DeviceDescriptor, DeviceId, ProcessId};
use crate::models::error::{AttachError, DeviceError};
use crate::traits::device_catalog::DeviceCatalog;
use crate::traits::output_backend::{OutputBackend, OutputHandle};
use crate::traits::process_attacher::{ProcessAttacher, ProcessTap};

pub fn device(id: u32, name: &str, has_output: bool) -> DeviceDescriptor {
    DeviceDescriptor::new(id, name, has_output)
}

/// Catalog backed by a mutable device list.
#[derive(Default)]
pub struct FakeCatalog {
    devices: Mutex<Vec<DeviceDescriptor>>,
    default_output: Mutex<Option<DeviceDescriptor>>,
    fail_enumeration: AtomicBool,
    pub list_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(devices),
            ..Default::default()
        })
    }

    pub fn set_default(&self, device: DeviceDescriptor) {
        *self.default_output.lock() = Some(device);
    }

    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        *self.devices.lock() = devices;
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }
}

impl DeviceCatalog for FakeCatalog {
    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(DeviceError::Enumeration("hardware property query failed".into()));
        }
        Ok(self.devices.lock().clone())
    }

    fn has_output_streams(&self, id: DeviceId) -> bool {
        self.devices
            .lock()
            .iter()
            .any(|d| d.id == id && d.has_output)
    }

    fn default_output_device(&self) -> Result<DeviceDescriptor, DeviceError> {
        self.default_output.lock().clone().ok_or(DeviceError::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Opened(DeviceId),
    Enqueued(DeviceId, usize),
    Stopped(DeviceId),
}

/// Output backend that records every hardware interaction.
#[derive(Default)]
pub struct FakeBackend {
    events: Arc<Mutex<Vec<BackendEvent>>>,
    refused: Mutex<HashSet<DeviceId>>,
    fail_enqueue: Arc<AtomicBool>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refuse(&self, id: u32) {
        self.refused.lock().insert(DeviceId::new(id));
    }

    pub fn fail_enqueue(&self, fail: bool) {
        self.fail_enqueue.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<BackendEvent> {
        self.events.lock().clone()
    }

    pub fn opened(&self) -> Vec<DeviceId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BackendEvent::Opened(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeHandle {
    device: DeviceId,
    events: Arc<Mutex<Vec<BackendEvent>>>,
    fail_enqueue: Arc<AtomicBool>,
}

impl OutputHandle for FakeHandle {
    fn enqueue(&mut self, samples: &[f32]) -> Result<(), DeviceError> {
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(DeviceError::Refused("queue stalled".into()));
        }
        self.events
            .lock()
            .push(BackendEvent::Enqueued(self.device, samples.len()));
        Ok(())
    }

    fn stop(&mut self) {
        self.events.lock().push(BackendEvent::Stopped(self.device));
    }
}

impl OutputBackend for FakeBackend {
    type Handle = FakeHandle;

    fn open(&self, device: &DeviceDescriptor, format: &AudioFormat) -> Result<FakeHandle, DeviceError> {
        assert_eq!(*format, AudioFormat::stereo_f32());
        if self.refused.lock().contains(&device.id) {
            return Err(DeviceError::Refused(format!("{} rejected the stream format", device.name)));
        }
        self.events.lock().push(BackendEvent::Opened(device.id));
        Ok(FakeHandle {
            device: device.id,
            events: Arc::clone(&self.events),
            fail_enqueue: Arc::clone(&self.fail_enqueue),
        })
    }
}

/// Blocks `attach` until opened, so tests can observe the `Starting` state.
#[derive(Default)]
pub struct AttachGate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl AttachGate {
    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }
}

/// Process attacher with scripted outcomes.
#[derive(Default)]
pub struct FakeAttacher {
    refusal: Mutex<Option<AttachError>>,
    gate: Mutex<Option<Arc<AttachGate>>>,
    pub attaches: AtomicUsize,
    pub releases: Arc<AtomicUsize>,
}

impl FakeAttacher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refuse_with(&self, err: AttachError) {
        *self.refusal.lock() = Some(err);
    }

    pub fn gated(&self) -> Arc<AttachGate> {
        let gate = Arc::new(AttachGate::default());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

pub struct FakeTap {
    device_name: String,
    releases: Arc<AtomicUsize>,
}

impl ProcessTap for FakeTap {
    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl ProcessAttacher for FakeAttacher {
    type Tap = FakeTap;

    fn attach(&self, pid: ProcessId) -> Result<FakeTap, AttachError> {
        self.attaches.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait();
        }
        if let Some(err) = self.refusal.lock().clone() {
            return Err(err);
        }
        Ok(FakeTap {
            device_name: format!("Process Tap {pid}"),
            releases: Arc::clone(&self.releases),
        })
    }
}
