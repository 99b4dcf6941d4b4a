//! Event logger with remote persistence of critical events

use super::SessionId;
use crate::sink::{Metadata, SinkHandle, SinkRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Event severity
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Levels that are persisted to the remote sink
    pub fn is_persisted(&self) -> bool {
        *self >= LogLevel::Error
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named logger for one session
///
/// Every event goes to `tracing`. ERROR and CRITICAL events are also
/// written to the remote sink when one is attached; sink failures are
/// reported locally and never propagated.
pub struct EventLogger {
    source: String,
    session: SessionId,
    sink: Option<SinkHandle>,
}

impl EventLogger {
    pub fn new(source: impl Into<String>, session: SessionId, sink: Option<SinkHandle>) -> Self {
        Self {
            source: source.into(),
            session,
            sink,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn has_remote_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Log an event; returns whether it was persisted remotely
    pub async fn log(&self, level: LogLevel, message: &str, metadata: Metadata) -> bool {
        self.emit(level, message, &metadata);

        if !level.is_persisted() {
            return false;
        }
        let Some(sink) = &self.sink else {
            return false;
        };

        let mut metadata = metadata;
        metadata.insert(
            "session_id".to_string(),
            Value::String(self.session.to_string()),
        );
        let record = SinkRecord::new(level, self.source.as_str(), message, metadata);

        match sink.write(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    source = %self.source,
                    sink = sink.name(),
                    error = %e,
                    "Failed to persist event to remote sink"
                );
                false
            }
        }
    }

    pub async fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, Metadata::new()).await;
    }

    pub async fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, Metadata::new()).await;
    }

    pub async fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message, Metadata::new()).await;
    }

    pub async fn error(&self, message: &str, metadata: Metadata) -> bool {
        self.log(LogLevel::Error, message, metadata).await
    }

    pub async fn critical(&self, message: &str, metadata: Metadata) -> bool {
        self.log(LogLevel::Critical, message, metadata).await
    }

    fn emit(&self, level: LogLevel, message: &str, metadata: &Metadata) {
        let source = self.source.as_str();
        let session = self.session.as_str();
        let metadata = Value::Object(metadata.clone());

        match level {
            LogLevel::Debug => {
                tracing::debug!(source, session, %metadata, "{}", message)
            }
            LogLevel::Info => {
                tracing::info!(source, session, %metadata, "{}", message)
            }
            LogLevel::Warning => {
                tracing::warn!(source, session, %metadata, "{}", message)
            }
            LogLevel::Error => {
                tracing::error!(source, session, %metadata, "{}", message)
            }
            LogLevel::Critical => {
                tracing::error!(source, session, critical = true, %metadata, "{}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemorySink, RemoteSink, SinkError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct BrokenSink;

    #[async_trait]
    impl RemoteSink for BrokenSink {
        async fn write(&self, _record: SinkRecord) -> Result<(), SinkError> {
            Err(SinkError::Rejected {
                status: 500,
                body: "boom".to_string(),
            })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn session() -> SessionId {
        SessionId::from_label("20260101_000000")
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Critical > LogLevel::Error);
        assert!(LogLevel::Error.is_persisted());
        assert!(LogLevel::Critical.is_persisted());
        assert!(!LogLevel::Warning.is_persisted());
        assert_eq!(LogLevel::Warning.to_string(), "WARNING");
    }

    #[tokio::test]
    async fn test_critical_forwarded_with_session() {
        let sink = Arc::new(MemorySink::new());
        let handle: SinkHandle = sink.clone();
        let logger = EventLogger::new("risk", session(), Some(handle));

        let mut metadata = Metadata::new();
        metadata.insert("drawdown".to_string(), json!("0.12"));
        assert!(logger.critical("Max drawdown reached", metadata).await);

        let records = sink.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Critical);
        assert_eq!(records[0].source, "risk");
        assert_eq!(records[0].message, "Max drawdown reached");
        assert_eq!(records[0].metadata["drawdown"], "0.12");
        assert_eq!(records[0].metadata["session_id"], "20260101_000000");
    }

    #[tokio::test]
    async fn test_low_levels_stay_local() {
        let sink = Arc::new(MemorySink::new());
        let handle: SinkHandle = sink.clone();
        let logger = EventLogger::new("engine", session(), Some(handle));

        logger.debug("tick").await;
        logger.info("started").await;
        logger.warning("slow feed").await;
        assert!(sink.is_empty().await);

        assert!(logger.error("order rejected", Metadata::new()).await);
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_without_sink() {
        let logger = EventLogger::new("engine", session(), None);
        assert!(!logger.has_remote_sink());
        assert!(!logger.critical("no sink attached", Metadata::new()).await);
    }

    #[tokio::test]
    async fn test_sink_failure_swallowed() {
        let logger = EventLogger::new("engine", session(), Some(Arc::new(BrokenSink) as SinkHandle));
        assert!(!logger.critical("still running", Metadata::new()).await);
    }
}
