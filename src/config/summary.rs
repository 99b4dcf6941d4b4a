//! Redacted view of [`Settings`] for diagnostics

use super::types::{ExchangeConfig, LogFormat, Settings, TradingMode};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Loggable projection of one exchange; credentials reduced to presence flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeSummary {
    pub name: String,
    pub authenticated: bool,
    pub has_api_key: bool,
    pub has_api_secret: bool,
    pub rate_limit: u32,
    pub enable_rate_limit: bool,
}

impl From<&ExchangeConfig> for ExchangeSummary {
    fn from(exchange: &ExchangeConfig) -> Self {
        Self {
            name: exchange.name.clone(),
            authenticated: exchange.is_authenticated(),
            has_api_key: exchange.api_key.is_some(),
            has_api_secret: exchange.api_secret.is_some(),
            rate_limit: exchange.rate_limit,
            enable_rate_limit: exchange.enable_rate_limit,
        }
    }
}

/// Loggable projection of [`Settings`]
///
/// Holds no credential values, so it is safe to print, serialize and ship
/// to log aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSummary {
    pub mode: TradingMode,
    pub initial_capital: Decimal,
    pub max_position_size_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub max_daily_loss_pct: Decimal,
    pub max_concurrent_trades: u32,
    pub retrain_interval_hours: u32,
    pub min_training_samples: u32,
    pub feature_window_size: u32,
    pub validation_split: Decimal,
    pub exchanges: Vec<ExchangeSummary>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub remote_sink_configured: bool,
}

impl Settings {
    /// Redacted summary for startup diagnostics
    pub fn to_summary(&self) -> SettingsSummary {
        let model = self.model_config();
        SettingsSummary {
            mode: self.mode(),
            initial_capital: self.initial_capital(),
            max_position_size_pct: self.max_position_size_pct(),
            stop_loss_pct: self.stop_loss_pct(),
            take_profit_pct: self.take_profit_pct(),
            max_daily_loss_pct: self.max_daily_loss_pct(),
            max_concurrent_trades: self.max_concurrent_trades(),
            retrain_interval_hours: model.retrain_interval_hours,
            min_training_samples: model.min_training_samples,
            feature_window_size: model.feature_window_size,
            validation_split: model.validation_split,
            exchanges: self.exchanges().values().map(ExchangeSummary::from).collect(),
            log_level: self.telemetry().log_level.clone(),
            log_format: self.telemetry().log_format,
            remote_sink_configured: self.remote_sink().credentials_path.is_some(),
        }
    }
}

impl fmt::Display for SettingsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Capital: {}", self.initial_capital)?;
        writeln!(
            f,
            "Risk: max_pos={}, stop_loss={}, take_profit={}, max_daily_loss={}, max_trades={}",
            self.max_position_size_pct,
            self.stop_loss_pct,
            self.take_profit_pct,
            self.max_daily_loss_pct,
            self.max_concurrent_trades
        )?;
        writeln!(
            f,
            "Model: retrain={}h, min_samples={}, window={}, validation_split={}",
            self.retrain_interval_hours,
            self.min_training_samples,
            self.feature_window_size,
            self.validation_split
        )?;
        writeln!(f, "Exchanges:")?;
        for exchange in &self.exchanges {
            writeln!(
                f,
                "  {}: {}, rate_limit={}{}",
                exchange.name,
                if exchange.authenticated {
                    "authenticated"
                } else {
                    "public"
                },
                exchange.rate_limit,
                if exchange.enable_rate_limit {
                    ""
                } else {
                    " (disabled)"
                }
            )?;
        }
        write!(
            f,
            "Logging: level={}, remote_sink={}",
            self.log_level,
            if self.remote_sink_configured {
                "configured"
            } else {
                "off"
            }
        )
    }
}
