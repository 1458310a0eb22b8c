use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex, ReentrantMutex};
use uuid::Uuid;

use crate::models::audio_models::ProcessId;
use crate::models::error::{AttachError, SessionError};
use crate::models::state::{CaptureState, CaptureStatus};
use crate::session::HELPER_VERSION;
use crate::traits::process_attacher::{ProcessAttacher, ProcessTap};
use crate::traits::session_observer::SessionObserver;

/// Bookkeeping for the session currently owned by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub pid: ProcessId,
    pub started_at: DateTime<Utc>,
}

impl SessionRecord {
    fn new(pid: ProcessId) -> Self {
        Self {
            id: Uuid::new_v4(),
            pid,
            started_at: Utc::now(),
        }
    }
}

struct SessionInner<T> {
    state: CaptureState,
    record: Option<SessionRecord>,
    tap: Option<T>,
    /// Bumped on every transition; orders observer notifications.
    seq: u64,
}

impl<T> SessionInner<T> {
    fn transition(&mut self, state: CaptureState) -> u64 {
        self.state = state;
        self.seq += 1;
        self.seq
    }
}

/// Owns the lifecycle of at most one process capture session.
///
/// Transitions are serialized by one mutex. Attaching and releasing the tap
/// happen outside it, with the session parked in `Starting` or `Stopping`;
/// `settled` wakes callers queued behind such a transition.
///
/// Observers run after the state lock is released, so two threads may race
/// to report their transitions. A notification older than one already
/// delivered is dropped, which keeps the last observed state equal to the
/// manager's state.
pub struct CaptureSessionManager<A: ProcessAttacher> {
    attacher: A,
    inner: Mutex<SessionInner<A::Tap>>,
    settled: Condvar,
    observer: Option<Arc<dyn SessionObserver>>,
    // Reentrant so an observer may call back into the manager.
    last_published: ReentrantMutex<Cell<u64>>,
}

impl<A: ProcessAttacher> CaptureSessionManager<A> {
    pub fn new(attacher: A) -> Self {
        Self {
            attacher,
            inner: Mutex::new(SessionInner {
                state: CaptureState::Idle,
                record: None,
                tap: None,
                seq: 0,
            }),
            settled: Condvar::new(),
            observer: None,
            last_published: ReentrantMutex::new(Cell::new(0)),
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    pub fn get_version(&self) -> String {
        HELPER_VERSION.to_string()
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state.clone()
    }

    /// The session currently starting, capturing or failed, if any.
    pub fn active_session(&self) -> Option<SessionRecord> {
        self.inner.lock().record.clone()
    }

    /// Attach to `pid` and begin capturing. Only valid from `Idle`.
    ///
    /// Returns the name of the device the tap resolved to.
    pub fn start_capture(&self, pid: ProcessId) -> Result<String, SessionError> {
        if pid <= 0 {
            return Err(SessionError::InvalidProcess(pid));
        }

        let (session_id, seq) = {
            let mut inner = self.inner.lock();
            match inner.state {
                CaptureState::Idle => {}
                CaptureState::Starting { .. } | CaptureState::Capturing { .. } => {
                    return Err(SessionError::AlreadyActive)
                }
                CaptureState::Stopping => return Err(SessionError::Busy),
                CaptureState::Failed(_) => return Err(SessionError::NeedsReset),
            }
            let record = SessionRecord::new(pid);
            let id = record.id;
            inner.record = Some(record);
            (id, inner.transition(CaptureState::Starting { pid }))
        };
        log::info!("Capture session {} starting for process {}", session_id, pid);
        self.publish(seq, &CaptureState::Starting { pid }, None);

        let attached = panic::catch_unwind(AssertUnwindSafe(|| self.attacher.attach(pid)))
            .unwrap_or_else(|_| Err(AttachError::Refused("attach panicked".into())));

        match attached {
            Ok(tap) => {
                let device_name = tap.device_name().to_owned();
                let state = CaptureState::Capturing {
                    pid,
                    device_name: device_name.clone(),
                };
                let seq = {
                    let mut inner = self.inner.lock();
                    inner.tap = Some(tap);
                    inner.transition(state.clone())
                };
                self.settled.notify_all();
                log::info!("Capture session {} bound to {}", session_id, device_name);
                self.publish(seq, &state, None);
                Ok(device_name)
            }
            Err(e) => {
                let err = SessionError::from(e);
                let state = CaptureState::Failed(err.clone());
                let seq = self.inner.lock().transition(state.clone());
                self.settled.notify_all();
                log::error!("Capture session {} failed to start: {}", session_id, err);
                self.publish(seq, &state, Some(&err));
                Err(err)
            }
        }
    }

    /// End the session and release the tap.
    ///
    /// Waits for an in-flight start or stop to settle first. No-op when idle.
    /// Also the way out of `Failed`.
    pub fn stop_capture(&self) -> Result<(), SessionError> {
        let (tap, record, seq) = {
            let mut inner = self.inner.lock();
            while inner.state.is_transitioning() {
                self.settled.wait(&mut inner);
            }
            if inner.state.is_idle() {
                return Ok(());
            }
            let seq = inner.transition(CaptureState::Stopping);
            (inner.tap.take(), inner.record.take(), seq)
        };
        self.publish(seq, &CaptureState::Stopping, None);

        if let Some(mut tap) = tap {
            tap.release();
        }

        let seq = self.inner.lock().transition(CaptureState::Idle);
        self.settled.notify_all();
        if let Some(record) = record {
            let elapsed = Utc::now().signed_duration_since(record.started_at);
            log::info!(
                "Capture session {} stopped after {} ms",
                record.id,
                elapsed.num_milliseconds()
            );
        }
        self.publish(seq, &CaptureState::Idle, None);
        Ok(())
    }

    /// Snapshot of the current state. Does not wait for transitions.
    pub fn get_capture_status(&self) -> CaptureStatus {
        CaptureStatus::from(&self.inner.lock().state)
    }

    /// Mark a live capture as failed, e.g. because the tap died.
    ///
    /// The tap is kept until `stop_capture` releases it. Returns `false` if
    /// the session was not capturing.
    pub fn report_failure(&self, reason: impl Into<String>) -> bool {
        let err = SessionError::CaptureAttach(reason.into());
        let state = CaptureState::Failed(err.clone());
        let seq = {
            let mut inner = self.inner.lock();
            if !inner.state.is_capturing() {
                return false;
            }
            inner.transition(state.clone())
        };
        log::warn!("Capture session failed while capturing: {}", err);
        self.publish(seq, &state, Some(&err));
        true
    }

    fn publish(&self, seq: u64, state: &CaptureState, error: Option<&SessionError>) {
        let Some(observer) = &self.observer else {
            return;
        };
        let last = self.last_published.lock();
        if seq <= last.get() {
            log::debug!("Skipping stale {} notification", state.name());
            return;
        }
        last.set(seq);
        if let Some(err) = error {
            observer.on_error(err);
        }
        observer.on_state_changed(state);
    }
}

impl<A: ProcessAttacher> Drop for CaptureSessionManager<A> {
    fn drop(&mut self) {
        if let Some(mut tap) = self.inner.get_mut().tap.take() {
            log::debug!("Releasing capture tap on drop");
            tap.release();
        }
    }
}
