//! trading-settings: Settings resolution for the trading system
//!
//! This library provides:
//! - Validated, immutable settings resolved from the environment
//! - Aggregated configuration errors with field-level detail
//! - Optional remote event sink, attached fail-soft at startup
//! - Redacted settings summaries for diagnostics
//! - Session-scoped structured logging and event forwarding

pub mod cli;
pub mod config;
pub mod sink;
pub mod telemetry;
