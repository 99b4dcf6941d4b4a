//! Telemetry module
//!
//! Structured logging, session identifiers, and the event logger that
//! forwards critical events to the remote sink

mod events;
mod logging;
mod session;

pub use events::{EventLogger, LogLevel};
pub use logging::{init_logging, LogFormat};
pub use session::SessionId;

use crate::config::TelemetryConfig;
use std::path::PathBuf;

/// Guard returned once telemetry is initialized
pub struct TelemetryGuard {
    session: SessionId,
    log_file: Option<PathBuf>,
}

impl TelemetryGuard {
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Error log file for this session, if file logging is enabled
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }
}

/// Initialize all telemetry subsystems for a new session
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let session = SessionId::now();
    let log_file = init_logging(config, &session)?;

    Ok(TelemetryGuard { session, log_file })
}
