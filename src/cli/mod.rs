//! CLI interface for the activity tracker
//!
//! Provides subcommands for:
//! - `run`: Fetch markets and write the activity report (default)
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use crate::config::Config;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "activity-tracker")]
#[command(about = "Volume, heat and price-mover report for Polymarket war markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,
}

impl Cli {
    /// Subcommand to execute; a bare invocation runs once
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch markets, rank activity and write the report
    Run(RunArgs),
    /// Show the effective configuration
    Config,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run(RunArgs::default())
    }
}

/// Render the effective configuration as TOML
pub fn show_config(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_bare_invocation_runs() {
        let cli = Cli::parse_from(["activity-tracker"]);
        assert_eq!(cli.config, "config.toml");
        assert!(matches!(cli.command(), Commands::Run(args) if !args.quiet));
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "activity-tracker",
            "run",
            "--top-n",
            "5",
            "--output",
            "out/report.json",
            "--snapshot",
            "out/snap.json",
            "--quiet",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.config, "custom.toml");
        match cli.command() {
            Commands::Run(args) => {
                assert_eq!(args.top_n, Some(5));
                assert_eq!(args.output, Some(PathBuf::from("out/report.json")));
                assert_eq!(args.snapshot, Some(PathBuf::from("out/snap.json")));
                assert!(args.quiet);
            }
            Commands::Config => panic!("expected run"),
        }
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::parse_from(["activity-tracker", "-c", "x.toml", "config"]);
        assert!(matches!(cli.command(), Commands::Config));
        assert_eq!(cli.config, "x.toml");
    }

    #[test]
    fn test_show_config_round_trips() {
        let rendered = show_config(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.report.top_n, 10);
        assert_eq!(parsed.api.tag_id, crate::config::DEFAULT_TAG_ID);
    }
}
