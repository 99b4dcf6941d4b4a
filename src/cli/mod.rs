//! CLI interface for trading-settings
//!
//! Provides subcommands for:
//! - `check`: Resolve settings and report problems
//! - `show`: Print the redacted settings summary
//! - `emit`: Send one event through the event logger

mod check;
mod emit;
mod show;

pub use check::CheckArgs;
pub use emit::EmitArgs;
pub use show::ShowArgs;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trading-settings")]
#[command(about = "Resolve and inspect trading system settings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Dotenv file loaded before reading the environment (defaults to ./.env)
    #[arg(short, long, global = true)]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve settings and report warnings
    Check(CheckArgs),
    /// Print the redacted settings summary
    Show(ShowArgs),
    /// Log one event, forwarding it to the remote sink when eligible
    Emit(EmitArgs),
}
