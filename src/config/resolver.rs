//! Settings resolution: environment -> validated [`Settings`]

use super::error::{Bound, ConfigError, ConfigErrors};
use super::types::{
    ApiCredential, ExchangeConfig, LogFormat, ModelConfig, RemoteSinkConfig, Settings,
    TelemetryConfig, TradingMode,
};
use super::Environment;
use crate::sink::{FirestoreConnector, SinkConnector, SinkCredentials, SinkHandle};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const TRADING_MODE: &str = "TRADING_MODE";
pub const ENABLED_EXCHANGES: &str = "ENABLED_EXCHANGES";
pub const FIREBASE_CREDENTIALS_PATH: &str = "FIREBASE_CREDENTIALS_PATH";
pub const REMOTE_SINK_TIMEOUT_SECS: &str = "REMOTE_SINK_TIMEOUT_SECS";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_FORMAT: &str = "LOG_FORMAT";
pub const LOG_DIR: &str = "LOG_DIR";

const DEFAULT_TRADING_MODE: &str = "paper";
const DEFAULT_EXCHANGES: &str = "binance,coinbase";
const DEFAULT_LOG_DIR: &str = "logs";

/// A decimal setting with its source variable, default and interval
struct DecimalField {
    name: &'static str,
    var: &'static str,
    default: Decimal,
    bound: Bound,
}

/// A positive integer setting
struct CountField {
    name: &'static str,
    var: &'static str,
    default: u32,
}

const INITIAL_CAPITAL: DecimalField = DecimalField {
    name: "initial_capital",
    var: "INITIAL_CAPITAL",
    default: dec!(10000),
    bound: Bound::Positive,
};
const MAX_POSITION_PCT: DecimalField = DecimalField {
    name: "max_position_size_pct",
    var: "MAX_POSITION_PCT",
    default: dec!(0.1),
    bound: Bound::UnitInterval,
};
const STOP_LOSS_PCT: DecimalField = DecimalField {
    name: "stop_loss_pct",
    var: "STOP_LOSS_PCT",
    default: dec!(0.02),
    bound: Bound::UnitInterval,
};
const TAKE_PROFIT_PCT: DecimalField = DecimalField {
    name: "take_profit_pct",
    var: "TAKE_PROFIT_PCT",
    default: dec!(0.05),
    bound: Bound::UnitInterval,
};
const MAX_DAILY_LOSS_PCT: DecimalField = DecimalField {
    name: "max_daily_loss_pct",
    var: "MAX_DAILY_LOSS_PCT",
    default: dec!(0.05),
    bound: Bound::UnitInterval,
};
const VALIDATION_SPLIT: DecimalField = DecimalField {
    name: "model_config.validation_split",
    var: "VALIDATION_SPLIT",
    default: dec!(0.2),
    bound: Bound::OpenUnitInterval,
};

const MAX_CONCURRENT_TRADES: CountField = CountField {
    name: "max_concurrent_trades",
    var: "MAX_CONCURRENT_TRADES",
    default: 5,
};
const RETRAIN_INTERVAL_HOURS: CountField = CountField {
    name: "model_config.retrain_interval_hours",
    var: "RETRAIN_INTERVAL_HOURS",
    default: 24,
};
const MIN_TRAINING_SAMPLES: CountField = CountField {
    name: "model_config.min_training_samples",
    var: "MIN_TRAINING_SAMPLES",
    default: 1000,
};
const FEATURE_WINDOW_SIZE: CountField = CountField {
    name: "model_config.feature_window_size",
    var: "FEATURE_WINDOW_SIZE",
    default: 50,
};
const SINK_TIMEOUT: CountField = CountField {
    name: "remote_sink.connect_timeout",
    var: REMOTE_SINK_TIMEOUT_SECS,
    default: 5,
};

/// Why the remote sink is not available for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkUnavailable {
    /// No credential path was configured
    NotConfigured,
    /// Credential file missing, unreadable, or malformed
    CredentialsUnusable { path: PathBuf, error: String },
    /// The connector returned an error
    ConnectFailed { error: String },
    /// The connector did not finish within the configured timeout
    TimedOut { after: Duration },
    /// The connector task panicked
    ConnectorCrashed { error: String },
}

/// Non-fatal outcome recorded during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    SinkUnavailable(SinkUnavailable),
}

impl ResolutionWarning {
    /// True for failures outside the normal "no credentials" fallback
    ///
    /// Callers may choose to refuse startup on these.
    pub fn is_unexpected(&self) -> bool {
        match self {
            ResolutionWarning::SinkUnavailable(reason) => matches!(
                reason,
                SinkUnavailable::ConnectFailed { .. }
                    | SinkUnavailable::TimedOut { .. }
                    | SinkUnavailable::ConnectorCrashed { .. }
            ),
        }
    }
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionWarning::SinkUnavailable(reason) => match reason {
                SinkUnavailable::NotConfigured => {
                    write!(f, "Remote sink credentials not configured, using local state only")
                }
                SinkUnavailable::CredentialsUnusable { path, error } => write!(
                    f,
                    "Remote sink credentials at {} unusable ({}), using local state only",
                    path.display(),
                    error
                ),
                SinkUnavailable::ConnectFailed { error } => {
                    write!(f, "Failed to connect remote sink: {}", error)
                }
                SinkUnavailable::TimedOut { after } => {
                    write!(f, "Remote sink connection timed out after {:?}", after)
                }
                SinkUnavailable::ConnectorCrashed { error } => {
                    write!(f, "Remote sink connector crashed: {}", error)
                }
            },
        }
    }
}

/// Result of a successful resolution
pub struct Resolution {
    settings: Settings,
    sink: Option<SinkHandle>,
    warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Remote sink capability, if it could be established
    pub fn sink(&self) -> Option<&SinkHandle> {
        self.sink.as_ref()
    }

    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Settings, Option<SinkHandle>, Vec<ResolutionWarning>) {
        (self.settings, self.sink, self.warnings)
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("settings", &self.settings)
            .field("sink", &self.sink.as_ref().map(|s| s.name().to_string()))
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Turns an [`Environment`] into [`Settings`] plus the optional sink
pub struct ConfigResolver {
    connector: Arc<dyn SinkConnector>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Resolver that connects the Firestore document sink
    pub fn new() -> Self {
        Self::with_connector(Arc::new(FirestoreConnector::new()))
    }

    pub fn with_connector(connector: Arc<dyn SinkConnector>) -> Self {
        Self { connector }
    }

    /// Full resolution: validate settings, then try to attach the sink
    ///
    /// Only validation failures are returned as errors; every sink
    /// problem degrades to a warning.
    pub async fn resolve(&self, env: &Environment) -> Result<Resolution, ConfigErrors> {
        let settings = Self::resolve_settings(env)?;
        let (sink, warnings) = self.establish_sink(settings.remote_sink()).await;
        Ok(Resolution {
            settings,
            sink,
            warnings,
        })
    }

    /// Validate settings without touching the sink
    ///
    /// Pure function of `env`. Collects every violation before failing.
    pub fn resolve_settings(env: &Environment) -> Result<Settings, ConfigErrors> {
        let mut fields = FieldReader::new(env);

        let mode = fields.choice(
            "mode",
            TRADING_MODE,
            DEFAULT_TRADING_MODE,
            TradingMode::VARIANTS,
            |s| s.parse::<TradingMode>().ok(),
        );
        let initial_capital = fields.decimal(&INITIAL_CAPITAL);
        let max_position_size_pct = fields.decimal(&MAX_POSITION_PCT);
        let stop_loss_pct = fields.decimal(&STOP_LOSS_PCT);
        let take_profit_pct = fields.decimal(&TAKE_PROFIT_PCT);
        let max_daily_loss_pct = fields.decimal(&MAX_DAILY_LOSS_PCT);
        let max_concurrent_trades = fields.count(&MAX_CONCURRENT_TRADES);
        let exchanges = fields.exchanges();
        let model_config = fields.model_config();
        let telemetry = fields.telemetry();
        let remote_sink = fields.remote_sink();

        let settings = Settings {
            mode: mode.unwrap_or_default(),
            initial_capital: initial_capital.unwrap_or(INITIAL_CAPITAL.default),
            max_position_size_pct: max_position_size_pct.unwrap_or(MAX_POSITION_PCT.default),
            stop_loss_pct: stop_loss_pct.unwrap_or(STOP_LOSS_PCT.default),
            take_profit_pct: take_profit_pct.unwrap_or(TAKE_PROFIT_PCT.default),
            max_daily_loss_pct: max_daily_loss_pct.unwrap_or(MAX_DAILY_LOSS_PCT.default),
            max_concurrent_trades: max_concurrent_trades.unwrap_or(MAX_CONCURRENT_TRADES.default),
            model_config,
            exchanges,
            telemetry,
            remote_sink,
        };

        // Placeholders above are only ever seen when errors exist
        match ConfigErrors::new(fields.into_errors()) {
            Some(errors) => Err(errors),
            None => Ok(settings),
        }
    }

    async fn establish_sink(
        &self,
        config: &RemoteSinkConfig,
    ) -> (Option<SinkHandle>, Vec<ResolutionWarning>) {
        let unavailable = |reason| (None, vec![ResolutionWarning::SinkUnavailable(reason)]);

        let Some(path) = config.credentials_path.as_ref() else {
            return unavailable(SinkUnavailable::NotConfigured);
        };

        // Reading the file and connecting share one deadline
        let connector = Arc::clone(&self.connector);
        let credentials_path = path.clone();
        let task = tokio::spawn(async move {
            let credentials = SinkCredentials::load(&credentials_path)
                .await
                .map_err(|e| SinkUnavailable::CredentialsUnusable {
                    path: credentials_path.clone(),
                    error: e.to_string(),
                })?;
            let sink = connector
                .connect(credentials)
                .await
                .map_err(|e| SinkUnavailable::ConnectFailed {
                    error: e.to_string(),
                })?;
            Ok::<SinkHandle, SinkUnavailable>(sink)
        });
        let abort = task.abort_handle();

        match tokio::time::timeout(config.connect_timeout, task).await {
            Ok(Ok(Ok(sink))) => (Some(sink), Vec::new()),
            Ok(Ok(Err(reason))) => unavailable(reason),
            Ok(Err(join_error)) => unavailable(SinkUnavailable::ConnectorCrashed {
                error: join_error.to_string(),
            }),
            Err(_) => {
                abort.abort();
                unavailable(SinkUnavailable::TimedOut {
                    after: config.connect_timeout,
                })
            }
        }
    }
}

/// Reads typed fields and accumulates every violation
struct FieldReader<'a> {
    env: &'a Environment,
    errors: Vec<ConfigError>,
}

impl<'a> FieldReader<'a> {
    fn new(env: &'a Environment) -> Self {
        Self {
            env,
            errors: Vec::new(),
        }
    }

    fn into_errors(self) -> Vec<ConfigError> {
        self.errors
    }

    fn choice<T>(
        &mut self,
        field: &str,
        var: &str,
        default: &str,
        allowed: &[&'static str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let raw = self.env.get(var).unwrap_or(default);
        let parsed = parse(raw);
        if parsed.is_none() {
            self.errors.push(ConfigError::InvalidEnum {
                field: field.to_string(),
                variable: var.to_string(),
                value: raw.to_string(),
                allowed: allowed.to_vec(),
            });
        }
        parsed
    }

    fn decimal(&mut self, spec: &DecimalField) -> Option<Decimal> {
        let Some(raw) = self.env.get(spec.var) else {
            return Some(spec.default);
        };

        let value = match Decimal::from_str(raw.trim())
            .or_else(|_| Decimal::from_scientific(raw.trim()))
        {
            Ok(value) => value,
            Err(_) => {
                self.invalid_type(spec.name, spec.var, raw, "decimal number");
                return None;
            }
        };

        let in_range = match spec.bound {
            Bound::Positive => value > Decimal::ZERO,
            Bound::UnitInterval => value > Decimal::ZERO && value <= Decimal::ONE,
            Bound::OpenUnitInterval => value > Decimal::ZERO && value < Decimal::ONE,
        };
        if !in_range {
            self.errors.push(ConfigError::OutOfRange {
                field: spec.name.to_string(),
                variable: spec.var.to_string(),
                value: raw.trim().to_string(),
                bound: spec.bound,
            });
            return None;
        }

        Some(value)
    }

    fn count(&mut self, spec: &CountField) -> Option<u32> {
        self.positive_u32(spec.name, spec.var, spec.default)
    }

    fn positive_u32(&mut self, field: &str, var: &str, default: u32) -> Option<u32> {
        let Some(raw) = self.env.get(var) else {
            return Some(default);
        };

        let value = match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.invalid_type(field, var, raw, "integer");
                return None;
            }
        };

        if value <= 0 {
            self.errors.push(ConfigError::OutOfRange {
                field: field.to_string(),
                variable: var.to_string(),
                value: raw.trim().to_string(),
                bound: Bound::Positive,
            });
            return None;
        }

        match u32::try_from(value) {
            Ok(value) => Some(value),
            Err(_) => {
                self.invalid_type(field, var, raw, "32-bit unsigned integer");
                None
            }
        }
    }

    fn flag(&mut self, field: &str, var: &str, default: bool) -> Option<bool> {
        let Some(raw) = self.env.get(var) else {
            return Some(default);
        };

        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                self.invalid_type(field, var, raw, "boolean");
                None
            }
        }
    }

    fn invalid_type(&mut self, field: &str, var: &str, raw: &str, expected: &'static str) {
        self.errors.push(ConfigError::InvalidType {
            field: field.to_string(),
            variable: var.to_string(),
            value: raw.to_string(),
            expected,
        });
    }

    fn exchanges(&mut self) -> BTreeMap<String, ExchangeConfig> {
        let raw = self.env.get(ENABLED_EXCHANGES).unwrap_or(DEFAULT_EXCHANGES);
        let mut exchanges = BTreeMap::new();
        // Variable prefix -> exchange that claimed it
        let mut prefixes: BTreeMap<String, String> = BTreeMap::new();
        let mut named = 0usize;

        for segment in raw.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            named += 1;

            let name = segment.to_lowercase();
            if !is_exchange_identifier(&name) {
                self.invalid_type("exchanges", ENABLED_EXCHANGES, segment, "exchange identifier");
                continue;
            }
            if exchanges.contains_key(&name) {
                continue;
            }

            let prefix = env_prefix(&name);
            if let Some(owner) = prefixes.get(&prefix) {
                self.errors.push(ConfigError::InconsistentFields {
                    fields: vec![format!("exchanges.{owner}"), format!("exchanges.{name}")],
                    reason: format!("both would read the {prefix}_* variables"),
                });
                continue;
            }
            prefixes.insert(prefix, name.clone());

            let exchange = self.exchange(&name);
            exchanges.insert(name, exchange);
        }

        if named == 0 {
            self.errors.push(ConfigError::MissingRequired {
                field: "exchanges".to_string(),
                variable: ENABLED_EXCHANGES.to_string(),
            });
        }

        exchanges
    }

    fn exchange(&mut self, name: &str) -> ExchangeConfig {
        let prefix = env_prefix(name);
        let credential =
            |suffix: &str| self.env.get_non_blank(&format!("{prefix}_{suffix}")).map(ApiCredential::new);
        let api_key = credential("API_KEY");
        let api_secret = credential("API_SECRET");

        let rate_limit = self.positive_u32(
            &format!("exchanges.{name}.rate_limit"),
            &format!("{prefix}_RATE_LIMIT"),
            ExchangeConfig::DEFAULT_RATE_LIMIT,
        );
        let enable_rate_limit = self.flag(
            &format!("exchanges.{name}.enable_rate_limit"),
            &format!("{prefix}_ENABLE_RATE_LIMIT"),
            true,
        );

        ExchangeConfig {
            name: name.to_string(),
            api_key,
            api_secret,
            rate_limit: rate_limit.unwrap_or(ExchangeConfig::DEFAULT_RATE_LIMIT),
            enable_rate_limit: enable_rate_limit.unwrap_or(true),
        }
    }

    fn model_config(&mut self) -> ModelConfig {
        let retrain_interval_hours = self.count(&RETRAIN_INTERVAL_HOURS);
        let min_training_samples = self.count(&MIN_TRAINING_SAMPLES);
        let feature_window_size = self.count(&FEATURE_WINDOW_SIZE);
        let validation_split = self.decimal(&VALIDATION_SPLIT);

        if let (Some(window), Some(samples)) = (feature_window_size, min_training_samples) {
            if window > samples {
                self.errors.push(ConfigError::InconsistentFields {
                    fields: vec![
                        FEATURE_WINDOW_SIZE.name.to_string(),
                        MIN_TRAINING_SAMPLES.name.to_string(),
                    ],
                    reason: format!(
                        "feature window of {} exceeds the {} minimum training samples",
                        window, samples
                    ),
                });
            }
        }

        ModelConfig {
            retrain_interval_hours: retrain_interval_hours
                .unwrap_or(RETRAIN_INTERVAL_HOURS.default),
            min_training_samples: min_training_samples.unwrap_or(MIN_TRAINING_SAMPLES.default),
            feature_window_size: feature_window_size.unwrap_or(FEATURE_WINDOW_SIZE.default),
            validation_split: validation_split.unwrap_or(VALIDATION_SPLIT.default),
        }
    }

    fn telemetry(&mut self) -> TelemetryConfig {
        let log_level = self.choice(
            "telemetry.log_level",
            LOG_LEVEL,
            "info",
            TelemetryConfig::LEVELS,
            |s| {
                let level = s.trim().to_lowercase();
                TelemetryConfig::LEVELS
                    .contains(&level.as_str())
                    .then_some(level)
            },
        );
        let log_format = self.choice(
            "telemetry.log_format",
            LOG_FORMAT,
            "pretty",
            LogFormat::VARIANTS,
            |s| s.parse::<LogFormat>().ok(),
        );
        let log_dir = match self.env.get(LOG_DIR) {
            None => Some(PathBuf::from(DEFAULT_LOG_DIR)),
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw.trim())),
        };

        TelemetryConfig {
            log_level: log_level.unwrap_or_else(|| "info".to_string()),
            log_format: log_format.unwrap_or_default(),
            log_dir,
        }
    }

    fn remote_sink(&mut self) -> RemoteSinkConfig {
        let timeout_secs = self.count(&SINK_TIMEOUT).unwrap_or(SINK_TIMEOUT.default);
        RemoteSinkConfig {
            credentials_path: self
                .env
                .get_non_blank(FIREBASE_CREDENTIALS_PATH)
                .map(PathBuf::from),
            connect_timeout: Duration::from_secs(u64::from(timeout_secs)),
        }
    }
}

/// Prefix of an exchange's variables: `okx-futures` -> `OKX_FUTURES`
fn env_prefix(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

fn is_exchange_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
