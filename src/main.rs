use clap::Parser;
use trading_settings::cli::{Cli, Commands};
use trading_settings::config::{ConfigResolver, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = Environment::from_process_with_dotenv(cli.env_file.as_deref())?;

    // Invalid settings abort startup with every error listed
    let resolution = ConfigResolver::new().resolve(&env).await?;

    let telemetry = trading_settings::telemetry::init_telemetry(resolution.settings().telemetry())?;
    tracing::info!(
        session = %telemetry.session(),
        log_file = ?telemetry.log_file(),
        "Settings resolved"
    );
    if let Some(sink) = resolution.sink() {
        tracing::info!(sink = sink.name(), "Remote sink connected");
    }
    for warning in resolution.warnings() {
        if warning.is_unexpected() {
            tracing::error!("{}", warning);
        } else {
            tracing::warn!("{}", warning);
        }
    }
    tracing::debug!(
        summary = %serde_json::to_string(&resolution.settings().to_summary())?,
        "Active settings"
    );

    match cli.command {
        Commands::Check(args) => args.execute(&resolution)?,
        Commands::Show(args) => args.execute(resolution.settings())?,
        Commands::Emit(args) => args.execute(&resolution, telemetry.session()).await?,
    }

    Ok(())
}
