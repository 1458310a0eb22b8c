use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFormat, DeviceDescriptor, DeviceId, RoutingCounters, RoutingDiagnostics};
use crate::models::config::PassthroughConfiguration;
use crate::models::error::RoutingError;
use crate::processing::frame_buffer::FrameBuffer;
use crate::traits::output_backend::{OutputBackend, OutputHandle};

/// Sentinel stored in `current_target` while nothing is bound.
const NO_TARGET: u64 = u64::MAX;

/// Internal mutable routing state, protected by `parking_lot::Mutex`.
struct RoutingState<H> {
    target: Option<DeviceDescriptor>,
    handle: Option<H>,
    buffer: FrameBuffer,
    /// Largest frame count ever requested, including refused ones.
    high_water_frames: usize,
}

/// Owns the physical target device, its output handle and the staging buffer.
///
/// One mutex serializes `initialize`, `send_frames` and `shutdown`.
/// Reconfiguration takes the lock blocking; the frame path only ever
/// `try_lock`s and reports `Busy` instead of waiting.
///
/// ```text
/// send_frames ─try_lock─┐
///                        ├→ [FrameBuffer] → [OutputHandle] → hardware
/// initialize ──lock─────┘
/// ```
pub struct RoutingContext<B: OutputBackend> {
    backend: B,
    format: AudioFormat,
    initial_frames: usize,
    state: Mutex<RoutingState<B::Handle>>,
    // Mirror of the bound target id, readable without the lock.
    current_target: AtomicU64,
    counters: RoutingCounters,
}

impl<B: OutputBackend> RoutingContext<B> {
    pub fn new(backend: B, initial_frames: usize) -> Self {
        Self {
            backend,
            format: AudioFormat::stereo_f32(),
            initial_frames: initial_frames.max(1),
            state: Mutex::new(RoutingState {
                target: None,
                handle: None,
                buffer: FrameBuffer::default(),
                high_water_frames: 0,
            }),
            current_target: AtomicU64::new(NO_TARGET),
            counters: RoutingCounters::default(),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Bind the output to `target`.
    ///
    /// Returns immediately if `target` is already bound. A handle on another
    /// device is stopped and dropped before the new one is opened, so two
    /// live handles never coexist. On refusal the context is left unbound.
    pub fn initialize(&self, target: &DeviceDescriptor) -> Result<(), RoutingError> {
        let mut state = self.state.lock();

        let already_bound = state.handle.is_some() && state.target.as_ref().map(|t| t.id) == Some(target.id);
        if already_bound {
            return Ok(());
        }

        Self::teardown(&mut state);
        self.current_target.store(NO_TARGET, Ordering::Release);

        let handle = self
            .backend
            .open(target, &self.format)
            .map_err(|e| RoutingError::DeviceBind {
                device: target.id,
                reason: e.to_string(),
            })?;

        let frames = self
            .initial_frames
            .max(state.high_water_frames)
            .min(PassthroughConfiguration::max_buffer_frames());
        state.buffer = FrameBuffer::with_capacity(self.format.samples_for(frames));
        state.handle = Some(handle);
        state.target = Some(target.clone());
        self.current_target.store(u64::from(target.id.get()), Ordering::Release);

        log::info!(
            "Routing output to {} with a {} frame buffer",
            target,
            frames
        );
        Ok(())
    }

    /// Copy `frame_count` interleaved frames into the buffer and queue them.
    ///
    /// Never waits on the lock: a reconfiguration in progress yields `Busy`.
    /// Oversized requests are refused whole with `BufferOverflow`; the
    /// buffer's recorded size is left untouched.
    pub fn send_frames(&self, samples: &[f32], frame_count: usize) -> Result<(), RoutingError> {
        let Some(mut guard) = self.state.try_lock() else {
            RoutingCounters::bump(&self.counters.busy_rejections, 1);
            return Err(RoutingError::Busy);
        };
        let state = &mut *guard;

        let Some(handle) = state.handle.as_mut() else {
            RoutingCounters::bump(&self.counters.not_initialized, 1);
            return Err(RoutingError::NotInitialized);
        };

        let expected = self.format.samples_for(frame_count);
        if samples.len() != expected {
            return Err(RoutingError::InvalidBuffer {
                expected,
                actual: samples.len(),
            });
        }

        if !state.buffer.write(samples) {
            state.high_water_frames = state.high_water_frames.max(frame_count);
            RoutingCounters::bump(&self.counters.buffer_overflows, 1);
            return Err(RoutingError::BufferOverflow {
                requested_bytes: self.format.bytes_for(frame_count),
                capacity_bytes: state.buffer.capacity_bytes(),
            });
        }
        state.high_water_frames = state.high_water_frames.max(frame_count);

        if frame_count == 0 {
            return Ok(());
        }

        handle
            .enqueue(state.buffer.as_slice())
            .map_err(|e| RoutingError::Playback(e.to_string()))?;
        RoutingCounters::bump(&self.counters.frames_delivered, frame_count as u64);
        Ok(())
    }

    /// Stop playback and release the handle and buffer. No-op when unbound.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        Self::teardown(&mut state);
        self.current_target.store(NO_TARGET, Ordering::Release);
    }

    /// Currently bound device, if any.
    pub fn target(&self) -> Option<DeviceDescriptor> {
        self.state.lock().target.clone()
    }

    /// Bound device id, read without taking the routing lock.
    pub fn target_id(&self) -> Option<DeviceId> {
        match self.current_target.load(Ordering::Acquire) {
            NO_TARGET => None,
            raw => Some(DeviceId::new(raw as u32)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    pub fn buffer_capacity_bytes(&self) -> usize {
        self.state.lock().buffer.capacity_bytes()
    }

    /// Byte size recorded by the last accepted delivery.
    pub fn buffered_bytes(&self) -> usize {
        self.state.lock().buffer.byte_size()
    }

    pub fn diagnostics(&self) -> RoutingDiagnostics {
        self.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> &RoutingCounters {
        &self.counters
    }

    fn teardown(state: &mut RoutingState<B::Handle>) {
        let previous = state.target.take();
        if let Some(mut handle) = state.handle.take() {
            handle.stop();
            if let Some(device) = previous {
                log::info!("Released output on {}", device);
            }
        }
        state.buffer.release();
    }
}

impl<B: OutputBackend> Drop for RoutingContext<B> {
    fn drop(&mut self) {
        Self::teardown(self.state.get_mut());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{device, BackendEvent, FakeBackend};

    fn context(initial_frames: usize) -> (Arc<FakeBackend>, RoutingContext<Arc<FakeBackend>>) {
        let backend = FakeBackend::new();
        let ctx = RoutingContext::new(Arc::clone(&backend), initial_frames);
        (backend, ctx)
    }

    fn frames(count: usize) -> Vec<f32> {
        (0..count * 2).map(|i| (i % 7) as f32 * 0.1).collect()
    }

    #[test]
    fn send_before_initialize_is_not_initialized() {
        let (_backend, ctx) = context(64);

        assert_eq!(ctx.send_frames(&frames(4), 4), Err(RoutingError::NotInitialized));
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.diagnostics().not_initialized, 1);
    }

    #[test]
    fn send_within_capacity_succeeds_and_enqueues() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();

        for count in [1, 16, 63, 64] {
            assert_eq!(ctx.send_frames(&frames(count), count), Ok(()));
            assert!(ctx.is_initialized());
        }

        assert_eq!(ctx.buffered_bytes(), 64 * 8);
        assert!(backend
            .events()
            .contains(&BackendEvent::Enqueued(DeviceId::new(42), 128)));
        assert_eq!(ctx.diagnostics().frames_delivered, 1 + 16 + 63 + 64);
    }

    #[test]
    fn overflow_is_refused_without_touching_buffer() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();
        ctx.send_frames(&frames(10), 10).unwrap();
        let enqueued_before = backend.events().len();

        let result = ctx.send_frames(&frames(65), 65);

        assert_eq!(
            result,
            Err(RoutingError::BufferOverflow {
                requested_bytes: 65 * 8,
                capacity_bytes: 64 * 8,
            })
        );
        assert_eq!(ctx.buffered_bytes(), 10 * 8);
        assert_eq!(backend.events().len(), enqueued_before);
        assert!(ctx.is_initialized());
    }

    #[test]
    fn mismatched_sample_count_is_rejected() {
        let (_backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();

        let result = ctx.send_frames(&[0.0; 7], 4);

        assert_eq!(result, Err(RoutingError::InvalidBuffer { expected: 8, actual: 7 }));
        assert_eq!(ctx.buffered_bytes(), 0);
    }

    #[test]
    fn initialize_same_device_does_not_reopen() {
        let (backend, ctx) = context(64);
        let speakers = device(42, "Speakers", true);

        ctx.initialize(&speakers).unwrap();
        ctx.initialize(&speakers).unwrap();

        assert_eq!(backend.opened(), vec![DeviceId::new(42)]);
    }

    #[test]
    fn switching_devices_tears_down_before_opening() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();

        ctx.initialize(&device(7, "Headphones", true)).unwrap();

        assert_eq!(
            backend.events(),
            vec![
                BackendEvent::Opened(DeviceId::new(42)),
                BackendEvent::Stopped(DeviceId::new(42)),
                BackendEvent::Opened(DeviceId::new(7)),
            ]
        );
        assert_eq!(ctx.target_id(), Some(DeviceId::new(7)));
    }

    #[test]
    fn refused_bind_leaves_context_uninitialized() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();
        backend.refuse(9);

        let result = ctx.initialize(&device(9, "HDMI", true));

        assert!(matches!(result, Err(RoutingError::DeviceBind { device, .. }) if device == DeviceId::new(9)));
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.target(), None);
        assert_eq!(ctx.target_id(), None);
        assert_eq!(ctx.send_frames(&frames(1), 1), Err(RoutingError::NotInitialized));
    }

    #[test]
    fn shutdown_twice_is_a_noop() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();

        ctx.shutdown();
        ctx.shutdown();

        let stops = backend
            .events()
            .iter()
            .filter(|e| matches!(e, BackendEvent::Stopped(_)))
            .count();
        assert_eq!(stops, 1);
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.buffer_capacity_bytes(), 0);
    }

    #[test]
    fn shutdown_without_initialize_is_safe() {
        let (backend, ctx) = context(64);
        ctx.shutdown();
        assert!(backend.events().is_empty());
    }

    #[test]
    fn send_fails_fast_while_lock_is_held() {
        let (_backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();

        let held = ctx.state.lock();
        let result = ctx.send_frames(&frames(4), 4);
        drop(held);

        assert_eq!(result, Err(RoutingError::Busy));
        assert_eq!(ctx.diagnostics().busy_rejections, 1);
        assert_eq!(ctx.send_frames(&frames(4), 4), Ok(()));
    }

    #[test]
    fn overflow_grows_buffer_on_next_reconfiguration() {
        let (_backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();
        assert!(ctx.send_frames(&frames(100), 100).is_err());

        ctx.initialize(&device(7, "Headphones", true)).unwrap();

        assert_eq!(ctx.buffer_capacity_bytes(), 100 * 8);
        assert_eq!(ctx.send_frames(&frames(100), 100), Ok(()));
    }

    #[test]
    fn enqueue_failure_is_reported_as_playback() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();
        backend.fail_enqueue(true);

        let result = ctx.send_frames(&frames(4), 4);

        assert!(matches!(result, Err(RoutingError::Playback(_))));
        assert!(ctx.is_initialized());
    }

    #[test]
    fn drop_stops_live_handle() {
        let (backend, ctx) = context(64);
        ctx.initialize(&device(42, "Speakers", true)).unwrap();

        drop(ctx);

        assert_eq!(backend.events().last(), Some(&BackendEvent::Stopped(DeviceId::new(42))));
    }
}
