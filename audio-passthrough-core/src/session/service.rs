use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::ProcessId;
use crate::models::error::SessionError;
use crate::models::state::CaptureStatus;
use crate::session::manager::CaptureSessionManager;
use crate::traits::audio_helper::{AudioHelper, Reply};
use crate::traits::process_attacher::ProcessAttacher;

type ReplySlot = Arc<Mutex<Option<Reply<Result<(), SessionError>>>>>;

/// `AudioHelper` over a shared `CaptureSessionManager`.
///
/// Start and stop run on a short-lived named worker thread each, so a slow
/// attach never blocks the caller. Version and status reply inline.
pub struct CaptureService<A: ProcessAttacher> {
    manager: Arc<CaptureSessionManager<A>>,
}

impl<A> CaptureService<A>
where
    A: ProcessAttacher + 'static,
{
    pub fn new(manager: Arc<CaptureSessionManager<A>>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<CaptureSessionManager<A>> {
        &self.manager
    }

    fn run_detached<F>(&self, name: &str, reply: Reply<Result<(), SessionError>>, job: F)
    where
        F: FnOnce(&CaptureSessionManager<A>) -> Result<(), SessionError> + Send + 'static,
    {
        // The reply stays reachable from here in case the thread never starts.
        let slot: ReplySlot = Arc::new(Mutex::new(Some(reply)));
        let worker_slot = Arc::clone(&slot);
        let manager = Arc::clone(&self.manager);
        let thread_name = name.to_string();

        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| job(&manager))).unwrap_or_else(|_| {
                log::error!("{} worker panicked", thread_name);
                Err(SessionError::Internal(format!("{thread_name} worker panicked")))
            });
            let reply = worker_slot.lock().take();
            if let Some(reply) = reply {
                reply(result);
            }
        });

        if let Err(e) = spawned {
            log::error!("Failed to spawn {} worker: {}", name, e);
            let reply = slot.lock().take();
            if let Some(reply) = reply {
                reply(Err(SessionError::Internal(format!("failed to spawn worker: {e}"))));
            }
        }
    }
}

impl<A> AudioHelper for CaptureService<A>
where
    A: ProcessAttacher + 'static,
{
    fn get_version(&self, reply: Reply<String>) {
        reply(self.manager.get_version());
    }

    fn start_capture(&self, pid: ProcessId, reply: Reply<Result<(), SessionError>>) {
        self.run_detached("capture-start", reply, move |manager| {
            manager.start_capture(pid).map(|_| ())
        });
    }

    fn stop_capture(&self, reply: Reply<Result<(), SessionError>>) {
        self.run_detached("capture-stop", reply, |manager| manager.stop_capture());
    }

    fn get_capture_status(&self, reply: Reply<CaptureStatus>) {
        reply(self.manager.get_capture_status());
    }
}
