//! Show command implementation

use crate::config::Settings;
use clap::Args;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Print as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl ShowArgs {
    pub fn execute(&self, settings: &Settings) -> anyhow::Result<()> {
        let summary = settings.to_summary();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{}", summary);
        }
        Ok(())
    }
}
