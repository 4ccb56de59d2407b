use anyhow::Context;
use clap::Parser;
use war_activity_tracker::cli::{self, Cli, Commands};
use war_activity_tracker::config::{Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing file means defaults; a broken one is an error
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("No config at {}, using defaults", cli.config);
            Config::default()
        }
        Err(e) => return Err(e).with_context(|| format!("Loading {}", cli.config)),
    };
    config.apply_env()?;

    match cli.command() {
        Commands::Run(args) => {
            let telemetry = war_activity_tracker::telemetry::init_telemetry(&config.telemetry)?;
            let result = args.execute(config).await;
            if let Err(e) = telemetry.export_metrics() {
                tracing::error!(error = %e, "Failed to export metrics");
            }
            if let Err(e) = &result {
                tracing::error!(error = %format!("{e:#}"), "Run failed");
            }
            result?;
        }
        Commands::Config => {
            print!("{}", cli::show_config(&config)?);
        }
    }

    Ok(())
}
