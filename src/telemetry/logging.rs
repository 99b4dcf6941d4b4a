//! Structured logging setup

use super::SessionId;
use crate::config::TelemetryConfig;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

pub use crate::config::LogFormat;

/// Initialize logging for the session
///
/// Console output goes to stderr and honours `RUST_LOG` first, then the
/// configured level.
/// When a log directory is set, errors are additionally written to
/// `trading_<session>.log` inside it. Returns that file's path.
pub fn init_logging(
    config: &TelemetryConfig,
    session: &SessionId,
) -> anyhow::Result<Option<PathBuf>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console = match config.log_format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    let (error_file, path) = match &config.log_dir {
        Some(dir) => {
            let (file, path) = open_error_log(dir, session)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::ERROR);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(error_file)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    Ok(path)
}

fn open_error_log(dir: &Path, session: &SessionId) -> anyhow::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log dir {}: {}", dir.display(), e))?;
    let path = dir.join(session.log_file_name());
    let file = File::create(&path)
        .map_err(|e| anyhow::anyhow!("Failed to create log file {}: {}", path.display(), e))?;
    Ok((file, path))
}
