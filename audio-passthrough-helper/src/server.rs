//! Unix socket server for the helper protocol.
//!
//! The accept loop polls a non-blocking listener so a stop flag can end it.
//! Every connection gets its own thread, which reads request lines until the
//! peer hangs up and answers each one before reading the next. The server
//! waits for the service's own reply however long it takes; giving up is the
//! client's decision.

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use audio_passthrough_core::AudioHelper;

use crate::config::HelperConfiguration;
use crate::error::HelperError;
use crate::protocol::{self, Request, Response};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct HelperServer<H: AudioHelper> {
    listener: UnixListener,
    socket_path: PathBuf,
    helper: Arc<H>,
}

impl<H: AudioHelper + 'static> HelperServer<H> {
    /// Bind the socket, replacing a stale socket file left by a previous run.
    pub fn bind(config: &HelperConfiguration, helper: Arc<H>) -> Result<Self, HelperError> {
        config.validate().map_err(HelperError::Configuration)?;
        let socket_path = config.socket_path.clone();

        if let Some(parent) = socket_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if socket_path.exists() {
            log::info!("Removing stale socket file: {}", socket_path.display());
            std::fs::remove_file(&socket_path)?;
        }

        let listener = UnixListener::bind(&socket_path)?;
        listener.set_nonblocking(true)?;
        log::info!("Helper listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path,
            helper,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until `stop` is set.
    pub fn serve(&self, stop: &AtomicBool) -> Result<(), HelperError> {
        while !stop.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, _)) => self.spawn_connection(stream),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::error!("Accept failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        log::info!("Helper server stopped");
        Ok(())
    }

    /// Run `serve` on a background thread.
    pub fn spawn(self) -> io::Result<ServerHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let socket_path = self.socket_path.clone();

        let thread = thread::Builder::new()
            .name("helper-accept".into())
            .spawn(move || self.serve(&thread_stop))?;

        Ok(ServerHandle {
            stop,
            thread: Some(thread),
            socket_path,
        })
    }

    fn spawn_connection(&self, stream: UnixStream) {
        let helper = Arc::clone(&self.helper);
        let spawned = thread::Builder::new()
            .name("helper-conn".into())
            .spawn(move || {
                if let Err(e) = handle_connection(stream, helper.as_ref()) {
                    log::warn!("Connection closed with error: {}", e);
                }
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn connection thread: {}", e);
        }
    }
}

impl<H: AudioHelper> Drop for HelperServer<H> {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Failed to remove socket {}: {}", self.socket_path.display(), e);
            }
        }
    }
}

/// Owner of a server running on its own thread.
pub struct ServerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<(), HelperError>>>,
    socket_path: PathBuf,
}

impl ServerHandle {
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Stop accepting, wait for the accept loop, and remove the socket file.
    ///
    /// Connections already accepted finish on their own threads.
    pub fn shutdown(mut self) -> Result<(), HelperError> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<(), HelperError> {
        self.stop.store(true, Ordering::SeqCst);
        match self.thread.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(HelperError::Protocol("accept thread panicked".into()))),
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop_and_join() {
            log::warn!("Helper server ended with error: {}", e);
        }
    }
}

fn handle_connection<H: AudioHelper + ?Sized>(stream: UnixStream, helper: &H) -> Result<(), HelperError> {
    stream.set_nonblocking(false)?;
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match protocol::decode_request(&line) {
            Ok(request) => {
                log::debug!("Request: {:?}", request);
                dispatch(helper, request)
            }
            Err(e) => {
                log::warn!("Rejecting malformed request: {}", e);
                Response::error(e.to_string())
            }
        };
        writer.write_all(protocol::encode_line(&response)?.as_bytes())?;
        writer.flush()?;
    }
    Ok(())
}

/// Forward one request to the helper and wait for its reply.
pub(crate) fn dispatch<H: AudioHelper + ?Sized>(helper: &H, request: Request) -> Response {
    let (tx, rx) = mpsc::sync_channel(1);

    match request {
        Request::GetVersion => helper.get_version(Box::new(move |version| {
            let _ = tx.send(Response::Version { version });
        })),
        Request::StartCapture { pid } => helper.start_capture(
            pid,
            Box::new(move |result| {
                let _ = tx.send(Response::from_result(result));
            }),
        ),
        Request::StopCapture => helper.stop_capture(Box::new(move |result| {
            let _ = tx.send(Response::from_result(result));
        })),
        Request::GetCaptureStatus => helper.get_capture_status(Box::new(move |status| {
            let _ = tx.send(Response::from(status));
        })),
    }

    rx.recv().unwrap_or_else(|_| {
        log::error!("Helper dropped a reply without answering");
        Response::error("reply dropped without an answer")
    })
}
