//! Configuration for the trading system
//!
//! Settings are resolved once from the process environment into an
//! immutable, fully validated [`Settings`] snapshot. Resolution either
//! yields a complete snapshot or every validation error at once; the
//! optional remote event sink is attached on a best-effort basis.

mod env;
mod error;
mod handle;
mod resolver;
mod summary;
mod types;

pub use env::Environment;
pub use error::{Bound, ConfigError, ConfigErrorKind, ConfigErrors};
pub use handle::SettingsHandle;
pub use resolver::{
    ConfigResolver, Resolution, ResolutionWarning, SinkUnavailable, ENABLED_EXCHANGES,
    FIREBASE_CREDENTIALS_PATH, LOG_DIR, LOG_FORMAT, LOG_LEVEL, REMOTE_SINK_TIMEOUT_SECS,
    TRADING_MODE,
};
pub use summary::{ExchangeSummary, SettingsSummary};
pub use types::{
    ApiCredential, ExchangeConfig, LogFormat, ModelConfig, RemoteSinkConfig, Settings,
    TelemetryConfig, TradingMode,
};
