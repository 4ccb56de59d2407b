//! One tracker run: fetch, compute, persist

use crate::activity::{ActivityEngine, ActivityReport, Histories};
use crate::market::{FetchError, MarketFetcher, MarketRecord};
use crate::store::{ReportWriter, SnapshotStore};
use crate::telemetry::{self, CounterMetric, GaugeMetric};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub report: ActivityReport,
    /// Markets whose price history could not be fetched
    pub history_failures: usize,
    /// False when the snapshot could not be written; the next run then
    /// compares against the older snapshot
    pub snapshot_saved: bool,
    pub elapsed: Duration,
}

/// Drives a single run end to end
pub struct Pipeline<F> {
    fetcher: F,
    engine: ActivityEngine,
    store: SnapshotStore,
    writer: ReportWriter,
    request_delay: Duration,
}

impl<F: MarketFetcher> Pipeline<F> {
    pub fn new(
        fetcher: F,
        engine: ActivityEngine,
        store: SnapshotStore,
        writer: ReportWriter,
    ) -> Self {
        Self {
            fetcher,
            engine,
            store,
            writer,
            request_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive price history requests
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Execute one run as of `now`
    ///
    /// Fails only when the market list cannot be fetched or the report
    /// cannot be written. History and snapshot failures degrade.
    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        self.run_inner(run_id, now).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<RunSummary> {
        let started = Instant::now();
        tracing::info!(now = %now, "Starting activity run");

        let previous = self.store.load();

        let markets = dedup_by_slug(
            self.fetcher
                .fetch_markets()
                .await
                .context("Failed to fetch market list")?,
        );
        telemetry::increment(CounterMetric::MarketsFetched, markets.len() as u64);
        tracing::info!(markets = markets.len(), "Fetched markets");

        let mut histories = Histories::with_capacity(markets.len());
        let mut history_failures = 0usize;
        for (i, market) in markets.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            match self.fetcher.fetch_price_history(market, now).await {
                Ok(points) => {
                    histories.insert(market.slug.clone(), points);
                }
                Err(FetchError::MissingToken(slug)) => {
                    tracing::debug!(slug = %slug, "No reference token, skipping history");
                    history_failures += 1;
                }
                Err(e) => {
                    tracing::warn!(slug = %market.slug, error = %e, "Price history unavailable");
                    history_failures += 1;
                }
            }
        }
        telemetry::increment(CounterMetric::HistoryFailures, history_failures as u64);

        let outcome = self
            .engine
            .compute(&markets, &histories, previous.as_ref(), now)
            .context("Failed to compute activity report")?;

        self.writer
            .write(&outcome.report)
            .with_context(|| format!("Failed to write report to {}", self.writer.path().display()))?;

        let snapshot_saved = match self.store.save(&outcome.snapshot) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    path = %self.store.path().display(),
                    error = %e,
                    "Failed to save snapshot; next run compares against the older one"
                );
                false
            }
        };

        for (view, slugs) in outcome.report.view_orderings() {
            telemetry::set_ranked_entries(view, slugs.len());
        }
        telemetry::set_gauge(
            GaugeMetric::TotalMarkets,
            outcome.report.total_markets as f64,
        );
        telemetry::set_gauge(
            GaugeMetric::SnapshotMarkets,
            outcome.snapshot.len() as f64,
        );
        telemetry::increment(CounterMetric::RunsCompleted, 1);

        let elapsed = started.elapsed();
        telemetry::record_run_duration(elapsed);
        tracing::info!(
            markets = outcome.report.total_markets,
            history_failures,
            snapshot_saved,
            elapsed_ms = elapsed.as_millis() as u64,
            "Run complete"
        );

        Ok(RunSummary {
            run_id,
            report: outcome.report,
            history_failures,
            snapshot_saved,
            elapsed,
        })
    }
}

/// Keep the first record of each slug so every kept record gets its own history
fn dedup_by_slug(mut markets: Vec<MarketRecord>) -> Vec<MarketRecord> {
    let mut seen = HashSet::new();
    markets.retain(|record| {
        let first = seen.insert(record.slug.clone());
        if !first {
            tracing::warn!(slug = %record.slug, "Duplicate market in fetch, keeping the first");
        }
        first
    });
    markets
}
