//! Event forwarding from a resolved sink capability

use async_trait::async_trait;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use trading_settings::config::{ConfigResolver, Environment};
use trading_settings::sink::{
    Metadata, MemorySink, RemoteSink, SinkConnector, SinkCredentials, SinkError, SinkHandle,
};
use trading_settings::telemetry::{EventLogger, LogLevel, SessionId};

/// Hands out one shared in-memory sink so the test can inspect it
struct SharedConnector {
    sink: Arc<MemorySink>,
}

#[async_trait]
impl SinkConnector for SharedConnector {
    async fn connect(&self, credentials: SinkCredentials) -> Result<SinkHandle, SinkError> {
        assert_eq!(credentials.collection, "risk_events");
        let sink: SinkHandle = self.sink.clone();
        Ok(sink)
    }
}

struct FlakySink;

#[async_trait]
impl RemoteSink for FlakySink {
    async fn write(&self, _record: trading_settings::sink::SinkRecord) -> Result<(), SinkError> {
        Err(SinkError::Rejected {
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn test_resolved_sink_receives_critical_events() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"project_id": "trading-eco", "collection": "risk_events"}"#)
        .unwrap();

    let memory = Arc::new(MemorySink::new());
    let resolver = ConfigResolver::with_connector(Arc::new(SharedConnector {
        sink: memory.clone(),
    }));
    let env = Environment::new().with(
        "FIREBASE_CREDENTIALS_PATH",
        file.path().to_string_lossy().into_owned(),
    );
    let (_settings, sink, warnings) = resolver.resolve(&env).await.unwrap().into_parts();
    assert!(warnings.is_empty());

    let session = SessionId::from_label("20260410_093000");
    let logger = EventLogger::new("risk_manager", session, sink);

    logger.info("Position opened").await;
    logger.warning("Spread widening").await;

    let mut metadata = Metadata::new();
    metadata.insert("loss_pct".to_string(), json!(0.051));
    assert!(logger.critical("Daily loss limit breached", metadata).await);
    assert!(logger.error("Order rejected", Metadata::new()).await);

    let records = memory.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].level, LogLevel::Critical);
    assert_eq!(records[0].source, "risk_manager");
    assert_eq!(records[0].metadata["loss_pct"], json!(0.051));
    assert_eq!(records[0].metadata["session_id"], json!("20260410_093000"));
    assert_eq!(records[1].level, LogLevel::Error);
    assert_eq!(records[1].message, "Order rejected");
}

#[test]
fn test_failing_sink_does_not_propagate() {
    let sink: SinkHandle = Arc::new(FlakySink);
    let logger = EventLogger::new("engine", SessionId::now(), Some(sink));

    let persisted = tokio_test::block_on(logger.critical("Exchange halted", Metadata::new()));
    assert!(!persisted);
    assert!(logger.has_remote_sink());
}

#[test]
fn test_record_serializes_level_uppercase() {
    let record = trading_settings::sink::SinkRecord::new(
        LogLevel::Warning,
        "engine",
        "latency spike",
        Metadata::new(),
    );
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["level"], "WARNING");
    assert_eq!(value["source"], "engine");
}
