//! Emit command implementation

use crate::config::Resolution;
use crate::sink::Metadata;
use crate::telemetry::{EventLogger, LogLevel, SessionId};
use clap::Args;
use serde_json::Value;

#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Event severity
    #[arg(long, value_enum)]
    pub level: LogLevel,

    /// Event message
    #[arg(long)]
    pub message: String,

    /// Logger source name
    #[arg(long, default_value = "trading_ecosystem")]
    pub source: String,

    /// Metadata entry as KEY=VALUE (repeatable); JSON values are kept typed
    #[arg(long)]
    pub meta: Vec<String>,
}

impl EmitArgs {
    pub async fn execute(&self, resolution: &Resolution, session: &SessionId) -> anyhow::Result<()> {
        let metadata = parse_metadata(&self.meta)?;
        let logger = EventLogger::new(
            self.source.as_str(),
            session.clone(),
            resolution.sink().cloned(),
        );

        let persisted = logger.log(self.level, &self.message, metadata).await;
        println!(
            "{} event logged{}",
            self.level,
            if persisted {
                " and persisted remotely"
            } else {
                ""
            }
        );
        Ok(())
    }
}

fn parse_metadata(entries: &[String]) -> anyhow::Result<Metadata> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let (key, raw) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid metadata entry {:?}, expected KEY=VALUE", entry))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        metadata.insert(key.trim().to_string(), value);
    }
    Ok(metadata)
}
