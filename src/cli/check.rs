//! Check command implementation

use crate::config::Resolution;
use clap::Args;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Fail when the remote sink could not be established for an unexpected reason
    #[arg(long)]
    pub strict: bool,
}

impl CheckArgs {
    pub fn execute(&self, resolution: &Resolution) -> anyhow::Result<()> {
        let settings = resolution.settings();
        println!(
            "Configuration OK: mode={}, {} exchange(s), remote sink {}",
            settings.mode(),
            settings.exchanges().len(),
            if resolution.sink().is_some() {
                "connected"
            } else {
                "unavailable"
            }
        );

        for warning in resolution.warnings() {
            println!("  warning: {}", warning);
        }

        let unexpected = resolution
            .warnings()
            .iter()
            .filter(|w| w.is_unexpected())
            .count();
        if self.strict && unexpected > 0 {
            anyhow::bail!("{} unexpected warning(s) in strict mode", unexpected);
        }
        Ok(())
    }
}
