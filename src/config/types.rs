//! Settings data model

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Trading mode: simulated, real money, or historical replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Paper,
    Live,
    Backtest,
}

impl TradingMode {
    pub const VARIANTS: &'static [&'static str] = &["paper", "live", "backtest"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Paper => "paper",
            TradingMode::Live => "live",
            TradingMode::Backtest => "backtest",
        }
    }
}

/// Exact match only; `LIVE` or ` live ` are rejected
impl FromStr for TradingMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paper" => Ok(TradingMode::Paper),
            "live" => Ok(TradingMode::Live),
            "backtest" => Ok(TradingMode::Backtest),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model retraining parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub retrain_interval_hours: u32,
    pub min_training_samples: u32,
    /// Never larger than `min_training_samples`
    pub feature_window_size: u32,
    /// Fraction of samples held out, in (0, 1)
    pub validation_split: Decimal,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            retrain_interval_hours: 24,
            min_training_samples: 1000,
            feature_window_size: 50,
            validation_split: Decimal::new(2, 1), // 0.2
        }
    }
}

/// An exchange API key or secret
///
/// Wrapped so `Debug` and accidental formatting never print the value.
pub struct ApiCredential(SecretString);

impl ApiCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ApiCredential {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential([REDACTED])")
    }
}

impl PartialEq for ApiCredential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for ApiCredential {}

/// Per-exchange connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Lower-case identifier, unique within [`Settings::exchanges`]
    pub name: String,
    /// `None` means the exchange runs unauthenticated
    pub api_key: Option<ApiCredential>,
    pub api_secret: Option<ApiCredential>,
    /// Request budget per unit time
    pub rate_limit: u32,
    pub enable_rate_limit: bool,
}

impl ExchangeConfig {
    pub const DEFAULT_RATE_LIMIT: u32 = 1000;

    /// Unauthenticated exchange with default rate limiting
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: None,
            api_secret: None,
            rate_limit: Self::DEFAULT_RATE_LIMIT,
            enable_rate_limit: true,
        }
    }

    /// Both key and secret are present
    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl LogFormat {
    pub const VARIANTS: &'static [&'static str] = &["pretty", "json"];
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Directory for the error log file; `None` disables it
    pub log_dir: Option<PathBuf>,
}

impl TelemetryConfig {
    pub const LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

/// Where to find remote sink credentials and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSinkConfig {
    pub credentials_path: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl Default for RemoteSinkConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Fully validated settings for one process run
///
/// Only [`ConfigResolver`](super::ConfigResolver) builds these, and
/// nothing mutates one afterwards: a change means resolving a new
/// snapshot and publishing it through a
/// [`SettingsHandle`](super::SettingsHandle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub(crate) mode: TradingMode,
    pub(crate) initial_capital: Decimal,
    pub(crate) max_position_size_pct: Decimal,
    pub(crate) stop_loss_pct: Decimal,
    pub(crate) take_profit_pct: Decimal,
    pub(crate) max_daily_loss_pct: Decimal,
    pub(crate) max_concurrent_trades: u32,
    pub(crate) model_config: ModelConfig,
    pub(crate) exchanges: BTreeMap<String, ExchangeConfig>,
    pub(crate) telemetry: TelemetryConfig,
    pub(crate) remote_sink: RemoteSinkConfig,
}

impl Settings {
    pub fn mode(&self) -> TradingMode {
        self.mode
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn max_position_size_pct(&self) -> Decimal {
        self.max_position_size_pct
    }

    pub fn stop_loss_pct(&self) -> Decimal {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> Decimal {
        self.take_profit_pct
    }

    pub fn max_daily_loss_pct(&self) -> Decimal {
        self.max_daily_loss_pct
    }

    pub fn max_concurrent_trades(&self) -> u32 {
        self.max_concurrent_trades
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    /// Exchanges keyed by name, in name order
    pub fn exchanges(&self) -> &BTreeMap<String, ExchangeConfig> {
        &self.exchanges
    }

    pub fn exchange(&self, name: &str) -> Option<&ExchangeConfig> {
        self.exchanges.get(&name.to_lowercase())
    }

    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }

    pub fn remote_sink(&self) -> &RemoteSinkConfig {
        &self.remote_sink
    }
}
