//! Settings resolution through the public API

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trading_settings::config::{
    ConfigError, ConfigErrorKind, ConfigResolver, Environment, ResolutionWarning, SinkUnavailable,
    TradingMode,
};
use trading_settings::sink::{MemorySink, SinkConnector, SinkCredentials, SinkError, SinkHandle};

/// Connector that always succeeds and counts how often it was asked
#[derive(Default)]
struct CountingConnector {
    calls: AtomicUsize,
}

#[async_trait]
impl SinkConnector for CountingConnector {
    async fn connect(&self, _credentials: SinkCredentials) -> Result<SinkHandle, SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sink: SinkHandle = Arc::new(MemorySink::new());
        Ok(sink)
    }
}

fn credential_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn full_env() -> Environment {
    Environment::from_pairs([
        ("TRADING_MODE", "live"),
        ("INITIAL_CAPITAL", "50000"),
        ("MAX_POSITION_PCT", "0.25"),
        ("STOP_LOSS_PCT", "0.03"),
        ("TAKE_PROFIT_PCT", "0.08"),
        ("MAX_DAILY_LOSS_PCT", "0.04"),
        ("MAX_CONCURRENT_TRADES", "3"),
        ("RETRAIN_INTERVAL_HOURS", "12"),
        ("MIN_TRAINING_SAMPLES", "5000"),
        ("FEATURE_WINDOW_SIZE", "100"),
        ("VALIDATION_SPLIT", "0.3"),
        ("ENABLED_EXCHANGES", "binance,coinbase,kraken"),
        ("BINANCE_API_KEY", "key-b"),
        ("BINANCE_API_SECRET", "secret-b"),
        ("KRAKEN_RATE_LIMIT", "200"),
        ("KRAKEN_ENABLE_RATE_LIMIT", "false"),
    ])
}

#[test]
fn test_full_environment() {
    let settings = ConfigResolver::resolve_settings(&full_env()).unwrap();

    assert_eq!(settings.mode(), TradingMode::Live);
    assert_eq!(settings.initial_capital(), dec!(50000));
    assert_eq!(settings.max_position_size_pct(), dec!(0.25));
    assert_eq!(settings.stop_loss_pct(), dec!(0.03));
    assert_eq!(settings.take_profit_pct(), dec!(0.08));
    assert_eq!(settings.max_daily_loss_pct(), dec!(0.04));
    assert_eq!(settings.max_concurrent_trades(), 3);

    let model = settings.model_config();
    assert_eq!(model.retrain_interval_hours, 12);
    assert_eq!(model.min_training_samples, 5000);
    assert_eq!(model.feature_window_size, 100);
    assert_eq!(model.validation_split, dec!(0.3));

    let names: Vec<&str> = settings.exchanges().keys().map(String::as_str).collect();
    assert_eq!(names, ["binance", "coinbase", "kraken"]);
    assert!(settings.exchange("Binance").unwrap().is_authenticated());
    assert!(!settings.exchange("coinbase").unwrap().is_authenticated());

    let kraken = settings.exchange("kraken").unwrap();
    assert_eq!(kraken.rate_limit, 200);
    assert!(!kraken.enable_rate_limit);
}

#[test]
fn test_resolution_is_deterministic() {
    let first = ConfigResolver::resolve_settings(&full_env()).unwrap();
    let second = ConfigResolver::resolve_settings(&full_env()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_environment_uses_defaults() {
    let settings = ConfigResolver::resolve_settings(&Environment::new()).unwrap();

    assert_eq!(settings.mode(), TradingMode::Paper);
    assert_eq!(settings.initial_capital(), dec!(10000));
    assert_eq!(settings.max_position_size_pct(), dec!(0.1));
    assert_eq!(settings.max_concurrent_trades(), 5);
    assert_eq!(settings.exchanges().len(), 2);
    assert!(settings.exchange("binance").is_some());
    assert!(settings.exchange("coinbase").is_some());
    assert!(settings.remote_sink().credentials_path.is_none());
}

#[test]
fn test_unknown_trading_mode() {
    for value in ["margin", "", "papertrading", "LIVE", " live "] {
        let env = Environment::new().with("TRADING_MODE", value);
        let errors = ConfigResolver::resolve_settings(&env).unwrap_err();
        assert!(errors.has_kind(ConfigErrorKind::InvalidEnum), "{:?}", value);
    }
}

#[test]
fn test_exchange_names_deduplicated_case_insensitively() {
    let env = Environment::new().with("ENABLED_EXCHANGES", "Binance, BINANCE, coinbase");
    let settings = ConfigResolver::resolve_settings(&env).unwrap();

    let names: Vec<&str> = settings.exchanges().keys().map(String::as_str).collect();
    assert_eq!(names, ["binance", "coinbase"]);
}

#[test]
fn test_empty_exchange_list_is_missing() {
    for value in ["", " , ,"] {
        let env = Environment::new().with("ENABLED_EXCHANGES", value);
        let errors = ConfigResolver::resolve_settings(&env).unwrap_err();
        assert!(errors.has_kind(ConfigErrorKind::MissingRequired));
        assert_eq!(errors.for_field("exchanges").unwrap().kind(), ConfigErrorKind::MissingRequired);
    }
}

#[test]
fn test_position_pct_out_of_range() {
    let env = Environment::new().with("MAX_POSITION_PCT", "1.5");
    let errors = ConfigResolver::resolve_settings(&env).unwrap_err();

    assert_eq!(errors.len(), 1);
    match &errors.errors()[0] {
        ConfigError::OutOfRange {
            field,
            variable,
            value,
            ..
        } => {
            assert_eq!(field, "max_position_size_pct");
            assert_eq!(variable, "MAX_POSITION_PCT");
            assert_eq!(value, "1.5");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_feature_window_larger_than_samples() {
    let env = Environment::new()
        .with("FEATURE_WINDOW_SIZE", "2000")
        .with("MIN_TRAINING_SAMPLES", "1000");
    let errors = ConfigResolver::resolve_settings(&env).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(errors.has_kind(ConfigErrorKind::InconsistentFields));
}

#[test]
fn test_all_violations_reported_together() {
    let env = Environment::new()
        .with("TRADING_MODE", "yolo")
        .with("INITIAL_CAPITAL", "lots")
        .with("STOP_LOSS_PCT", "0")
        .with("ENABLED_EXCHANGES", "")
        .with("VALIDATION_SPLIT", "1");
    let errors = ConfigResolver::resolve_settings(&env).unwrap_err();

    assert_eq!(errors.len(), 5);
    assert!(errors.has_kind(ConfigErrorKind::InvalidEnum));
    assert!(errors.has_kind(ConfigErrorKind::InvalidType));
    assert!(errors.has_kind(ConfigErrorKind::OutOfRange));
    assert!(errors.has_kind(ConfigErrorKind::MissingRequired));

    let rendered = errors.to_string();
    assert!(rendered.starts_with("invalid configuration (5 errors)"));
    assert!(rendered.contains("VALIDATION_SPLIT"));
}

#[tokio::test]
async fn test_missing_credential_file_degrades() {
    let connector = Arc::new(CountingConnector::default());
    let resolver = ConfigResolver::with_connector(connector.clone());
    let env = Environment::new().with("FIREBASE_CREDENTIALS_PATH", "/nonexistent/firebase.json");

    let resolution = resolver.resolve(&env).await.unwrap();

    assert!(resolution.sink().is_none());
    assert_eq!(resolution.settings().mode(), TradingMode::Paper);
    assert_eq!(resolution.warnings().len(), 1);
    assert!(matches!(
        &resolution.warnings()[0],
        ResolutionWarning::SinkUnavailable(SinkUnavailable::CredentialsUnusable { .. })
    ));
    assert!(!resolution.warnings()[0].is_unexpected());
    assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_valid_credentials_attach_sink() {
    let file = credential_file(r#"{"project_id": "trading-eco"}"#);
    let connector = Arc::new(CountingConnector::default());
    let resolver = ConfigResolver::with_connector(connector.clone());
    let env = Environment::new().with(
        "FIREBASE_CREDENTIALS_PATH",
        file.path().to_string_lossy().into_owned(),
    );

    let resolution = resolver.resolve(&env).await.unwrap();

    assert_eq!(resolution.sink().map(|s| s.name()), Some("memory"));
    assert!(resolution.warnings().is_empty());
    assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    assert!(resolution.settings().to_summary().remote_sink_configured);
}

#[tokio::test]
async fn test_validation_errors_skip_sink() {
    let file = credential_file(r#"{"project_id": "trading-eco"}"#);
    let connector = Arc::new(CountingConnector::default());
    let resolver = ConfigResolver::with_connector(connector.clone());
    let env = Environment::new()
        .with("FIREBASE_CREDENTIALS_PATH", file.path().to_string_lossy().into_owned())
        .with("MAX_CONCURRENT_TRADES", "0");

    let errors = resolver.resolve(&env).await.unwrap_err();

    assert!(errors.has_kind(ConfigErrorKind::OutOfRange));
    assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_connector_times_out() {
    struct SlowConnector;

    #[async_trait]
    impl SinkConnector for SlowConnector {
        async fn connect(&self, _credentials: SinkCredentials) -> Result<SinkHandle, SinkError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let sink: SinkHandle = Arc::new(MemorySink::new());
            Ok(sink)
        }
    }

    let file = credential_file(r#"{"project_id": "trading-eco"}"#);
    let resolver = ConfigResolver::with_connector(Arc::new(SlowConnector));
    let env = Environment::new()
        .with("FIREBASE_CREDENTIALS_PATH", file.path().to_string_lossy().into_owned())
        .with("REMOTE_SINK_TIMEOUT_SECS", "2");

    let resolution = resolver.resolve(&env).await.unwrap();

    assert!(resolution.sink().is_none());
    assert_eq!(
        resolution.warnings(),
        [ResolutionWarning::SinkUnavailable(SinkUnavailable::TimedOut {
            after: Duration::from_secs(2)
        })]
    );
    assert!(resolution.warnings()[0].is_unexpected());
}

#[cfg(unix)]
#[tokio::test]
async fn test_fifo_credentials_do_not_stall_startup() {
    let dir = tempfile::tempdir().unwrap();
    let fifo = dir.path().join("firebase.json");
    let status = std::process::Command::new("mkfifo")
        .arg(&fifo)
        .status()
        .unwrap();
    assert!(status.success());

    let connector = Arc::new(CountingConnector::default());
    let resolver = ConfigResolver::with_connector(connector.clone());
    let env = Environment::new()
        .with("FIREBASE_CREDENTIALS_PATH", fifo.to_string_lossy().into_owned())
        .with("REMOTE_SINK_TIMEOUT_SECS", "1");

    let resolution = tokio::time::timeout(Duration::from_secs(8), resolver.resolve(&env))
        .await
        .expect("resolution stalled on a fifo")
        .unwrap();

    assert!(resolution.sink().is_none());
    assert!(matches!(
        resolution.warnings(),
        [ResolutionWarning::SinkUnavailable(SinkUnavailable::CredentialsUnusable { .. })]
    ));
    assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversized_credentials_rejected() {
    let padding = " ".repeat(128 * 1024);
    let file = credential_file(&format!(r#"{{"project_id": "trading-eco"}}{padding}"#));
    let connector = Arc::new(CountingConnector::default());
    let resolver = ConfigResolver::with_connector(connector.clone());
    let env = Environment::new().with(
        "FIREBASE_CREDENTIALS_PATH",
        file.path().to_string_lossy().into_owned(),
    );

    let resolution = resolver.resolve(&env).await.unwrap();

    assert!(resolution.sink().is_none());
    assert!(!resolution.warnings()[0].is_unexpected());
    assert!(resolution.warnings()[0].to_string().contains("larger than"));
    assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
}
