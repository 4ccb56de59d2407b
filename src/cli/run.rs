//! Run command implementation

use crate::activity::ActivityEngine;
use crate::config::Config;
use crate::market::PolymarketFetcher;
use crate::pipeline::{Pipeline, RunSummary};
use crate::store::{ReportWriter, SnapshotStore};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Rows per view in the printed summary
const SUMMARY_ROWS: usize = 5;

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Entries kept per ranked view
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Report file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Snapshot file to read and replace
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Skip the summary on stdout
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    /// Fold command-line overrides into `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(top_n) = self.top_n {
            config.report.top_n = top_n;
        }
        if let Some(output) = &self.output {
            config.storage.report_path = output.clone();
        }
        if let Some(snapshot) = &self.snapshot {
            config.storage.snapshot_path = snapshot.clone();
        }
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<RunSummary> {
        self.apply(&mut config);
        config.validate().context("Invalid configuration")?;

        let fetcher =
            PolymarketFetcher::from_config(&config.api).context("Failed to build API clients")?;
        let pipeline = Pipeline::new(
            fetcher,
            ActivityEngine::new(config.report.clone()),
            SnapshotStore::new(&config.storage.snapshot_path),
            ReportWriter::new(&config.storage.report_path),
        )
        .with_request_delay(Duration::from_millis(config.api.request_delay_ms));

        let summary = pipeline.run(chrono::Utc::now()).await?;

        if !self.quiet {
            print!("{}", summary.report.format_summary(SUMMARY_ROWS));
            println!(
                "Report written to {}",
                config.storage.report_path.display()
            );
            if summary.history_failures > 0 {
                println!(
                    "Price history unavailable for {} market(s)",
                    summary.history_failures
                );
            }
            if !summary.snapshot_saved {
                println!("Warning: snapshot was not saved");
            }
        }

        Ok(summary)
    }
}
