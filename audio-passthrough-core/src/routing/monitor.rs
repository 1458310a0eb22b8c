use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::routing::loop_guard::GuardOutcome;
use crate::routing::passthrough::Passthrough;
use crate::traits::device_catalog::DeviceCatalog;
use crate::traits::output_backend::OutputBackend;

struct MonitorShared {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Background thread running the loop guard on a fixed wall-clock interval.
///
/// Keeps device enumeration off the frame path: `deliver` only reads the
/// target id, this thread does the repointing.
pub struct GuardMonitor {
    shared: Arc<MonitorShared>,
    thread: Option<JoinHandle<()>>,
}

impl GuardMonitor {
    /// Spawn with the passthrough's configured guard interval.
    pub fn start<C, B>(passthrough: Arc<Passthrough<C, B>>) -> std::io::Result<Self>
    where
        C: DeviceCatalog + 'static,
        B: OutputBackend + 'static,
    {
        let interval = passthrough.config().guard_interval;
        Self::spawn(passthrough, interval)
    }

    pub fn spawn<C, B>(passthrough: Arc<Passthrough<C, B>>, interval: Duration) -> std::io::Result<Self>
    where
        C: DeviceCatalog + 'static,
        B: OutputBackend + 'static,
    {
        let shared = Arc::new(MonitorShared {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let thread_shared = Arc::clone(&shared);

        let thread = thread::Builder::new()
            .name("loop-guard".into())
            .spawn(move || {
                log::debug!("Loop guard monitor started, interval {:?}", interval);
                let mut last = None;
                let mut stopped = thread_shared.stopped.lock();
                while !*stopped {
                    let outcome = MutexGuard::unlocked(&mut stopped, || passthrough.run_guard_cycle());
                    if last != Some(outcome) {
                        report(outcome);
                        last = Some(outcome);
                    }
                    if *stopped {
                        break;
                    }
                    thread_shared.wake.wait_for(&mut stopped, interval);
                }
                log::debug!("Loop guard monitor stopped");
            })?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Stop the thread and wait for it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        *self.shared.stopped.lock() = true;
        self.shared.wake.notify_all();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Loop guard monitor thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for GuardMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn report(outcome: GuardOutcome) {
    match outcome {
        GuardOutcome::NoAlternative => {
            log::warn!("Output targets the virtual device and no physical output is available")
        }
        GuardOutcome::Repointed(_) | GuardOutcome::Clear => log::debug!("Loop guard: {:?}", outcome),
        GuardOutcome::Idle => log::trace!("Loop guard idle"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::models::audio_models::DeviceId;
    use crate::models::config::PassthroughConfiguration;
    use crate::test_support::{device, FakeBackend, FakeCatalog};

    fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        check()
    }

    #[test]
    fn monitor_repoints_self_target_in_background() {
        let catalog = FakeCatalog::new(vec![device(150, "Passthrough", true)]);
        let config = PassthroughConfiguration {
            guard_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let passthrough = Arc::new(Passthrough::new(Arc::clone(&catalog), FakeBackend::new(), config).unwrap());
        passthrough.routing().initialize(&device(150, "Passthrough", true)).unwrap();

        let mut monitor = GuardMonitor::start(Arc::clone(&passthrough)).unwrap();
        catalog.set_devices(vec![device(150, "Passthrough", true), device(42, "Speakers", true)]);

        let repointed = wait_until(Duration::from_secs(2), || {
            passthrough.routing().target_id() == Some(DeviceId::new(42))
        });
        monitor.stop();

        assert!(repointed);
        assert!(!monitor.is_running());
    }

    #[test]
    fn stop_returns_promptly_with_long_interval() {
        let passthrough = Arc::new(
            Passthrough::new(FakeCatalog::new(vec![]), FakeBackend::new(), PassthroughConfiguration::default())
                .unwrap(),
        );
        let mut monitor = GuardMonitor::spawn(passthrough, Duration::from_secs(3600)).unwrap();

        let started = Instant::now();
        monitor.stop();
        monitor.stop();

        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
