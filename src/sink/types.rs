//! Sink record and error types

use crate::telemetry::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Free-form structured context attached to a record
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A structured event persisted to the remote sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Logger name that produced the event
    pub source: String,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub metadata: Metadata,
}

impl SinkRecord {
    /// Create a record stamped with the current time
    pub fn new(
        level: LogLevel,
        source: impl Into<String>,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            source: source.into(),
            message: message.into(),
            metadata,
        }
    }
}

/// Remote sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Credential file could not be read
    #[error("Cannot read credentials {}: {source}", .path.display())]
    CredentialsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Credential file is not usable
    #[error("Invalid credentials {}: {reason}", .path.display())]
    InvalidCredentials { path: PathBuf, reason: String },
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Store answered with a non-success status
    #[error("Sink rejected request: {status} - {body}")]
    Rejected { status: u16, body: String },
}
