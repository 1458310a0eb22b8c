//! Helper binary: one capture session manager served over a local socket.

use std::path::PathBuf;
use std::process::ExitCode;

use audio_passthrough_helper::HelperError;
use clap::Parser;

#[derive(Parser)]
#[command(name = "audio-passthrough-helper")]
#[command(version)]
#[command(about = "Serve process capture sessions over a local socket", long_about = None)]
struct Cli {
    /// Socket path (defaults to a file in the system temp directory)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn run(cli: Cli) -> Result<(), HelperError> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use audio_passthrough_core::{CaptureService, CaptureSessionManager, HELPER_VERSION};
    use audio_passthrough_helper::{HelperConfiguration, HelperServer, LogObserver, ProcessProbeAttacher};

    let mut config = HelperConfiguration::default();
    if let Some(socket) = cli.socket {
        config.socket_path = socket;
    }

    let mut manager = CaptureSessionManager::new(ProcessProbeAttacher);
    manager.set_observer(Arc::new(LogObserver));
    let manager = Arc::new(manager);
    let service = Arc::new(CaptureService::new(Arc::clone(&manager)));

    let server = HelperServer::bind(&config, service)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        handler_stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| HelperError::Io(std::io::Error::other(e.to_string())))?;

    log::info!("audio-passthrough-helper {} ready", HELPER_VERSION);
    server.serve(&stop)?;

    if let Err(e) = manager.stop_capture() {
        log::warn!("Failed to stop capture on shutdown: {}", e);
    }
    Ok(())
}

#[cfg(not(unix))]
fn run(_cli: Cli) -> Result<(), HelperError> {
    Err(HelperError::Configuration(
        "the helper socket requires a Unix platform".into(),
    ))
}
