//! `mpvwalld` entry
//!
//! Launches one wallpaper session from the command line and keeps it alive until the player
//! exits. Initialization failures end the program with an error.

use clap::Parser;
use smol::channel::Sender;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::backends::LibMpv;
use crate::config::{self, DEFAULT_BINARY, SupervisorConfig};
use crate::content::{ContentDescriptor, Scaler, Screen, StreamQuality};
use crate::desktop::Desktop;
use crate::events::SessionError;
use crate::session::Session;

#[derive(Parser)]
#[command(
    version = "0.1.0",
    about = "Supervises an external libmpv wallpaper player"
)]
struct Cli {
    #[arg(
        long = "path",
        value_name = "FILE",
        help = "Media to display as wallpaper."
    )]
    path: PathBuf,

    #[arg(
        long = "stream",
        value_name = "QUALITY",
        default_value = "highest",
        help = "Preferred stream quality, name or 0 (lowest) to 6 (highest)."
    )]
    stream: StreamQuality,

    #[arg(
        long = "stretch",
        value_name = "MODE",
        default_value = "fill",
        help = "Scaling mode: fill, fit, stretch, tile, center or span."
    )]
    stretch: Scaler,

    #[arg(
        short = 's',
        long = "screen",
        value_name = "NAME",
        default_value = "default",
        help = "Screen the wallpaper is bound to."
    )]
    screen: String,

    #[arg(
        short = 'b',
        long = "binary",
        value_name = "PATH",
        help = "Path to the player binary."
    )]
    binary: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "data-dir",
        value_name = "PATH",
        help = "Runtime data directory of the player."
    )]
    data_dir: Option<PathBuf>,

    #[arg(
        short = 'w',
        long = "working-dir",
        value_name = "PATH",
        help = "Working directory of the player."
    )]
    working_dir: Option<PathBuf>,

    #[arg(
        long = "handshake-timeout",
        value_name = "DURATION",
        value_parser = parse_duration,
        help = "Give up waiting for the player window after this long, e.g. 10s."
    )]
    handshake_timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to set up logging: {0}")]
    Logger(#[from] fern::InitError),
    #[error("failed to create data directory: {0}")]
    DataDir(std::io::Error),
    #[error("wallpaper failed to initialise: {0}")]
    Init(SessionError),
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    duration_str::parse(value).map_err(|err| err.to_string())
}

impl Cli {
    fn into_parts(self) -> (SupervisorConfig, ContentDescriptor, Screen) {
        let mut config = SupervisorConfig::new(
            self.binary.unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)),
            self.data_dir.unwrap_or_else(config::sys_data_dir),
        );
        config.working_dir = self.working_dir;
        config.handshake_timeout = self.handshake_timeout;
        let content = ContentDescriptor::new(self.path, self.stretch, self.stream);
        (config, content, Screen::new(self.screen))
    }
}

/// Notices the refresh that follows the end of the session.
struct ExitSignal(Sender<()>);

impl Desktop for ExitSignal {
    fn refresh(&self) {
        log::info!("wallpaper gone, refreshing desktop");
        let _ = self.0.try_send(());
    }
}

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ));
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

/// The real start.
///
/// # Errors
/// Fatal errors that will cause the program to exit will be returned here.
pub async fn start() -> Result<(), DaemonError> {
    let (config, content, screen) = Cli::parse().into_parts();

    // If data directory does not exist, create it
    if !config.data_dir.is_dir() {
        std::fs::create_dir_all(&config.data_dir).map_err(DaemonError::DataDir)?;
    }
    setup_logger()?;

    let (tx, rx) = smol::channel::bounded(1);
    let session = Session::new(LibMpv, config, content, screen, Arc::new(ExitSignal(tx)));
    session.show();

    let event = session.initialized().await;
    if let Some(message) = &event.message {
        log::info!("{message}");
    }
    if let Some(err) = event.error {
        session.terminate();
        let _ = rx.recv().await;
        return Err(DaemonError::Init(err));
    }
    if let Some(handle) = session.window_handle() {
        log::info!("wallpaper window {handle} on {}", session.screen());
    }

    let _ = rx.recv().await;
    Ok(())
}
