//! Prometheus metrics

use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Markets that passed validation
    MarketsFetched,
    /// Price history requests that failed or were skipped
    HistoryFailures,
    /// Completed runs
    RunsCompleted,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Markets in the last report
    TotalMarkets,
    /// Markets carried in the stored snapshot
    SnapshotMarkets,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::MarketsFetched => "tracker_markets_fetched_total",
            CounterMetric::HistoryFailures => "tracker_history_failures_total",
            CounterMetric::RunsCompleted => "tracker_runs_completed_total",
        }
    }
}

impl GaugeMetric {
    pub fn name(self) -> &'static str {
        match self {
            GaugeMetric::TotalMarkets => "tracker_total_markets",
            GaugeMetric::SnapshotMarkets => "tracker_snapshot_markets",
        }
    }
}

const RANKED_ENTRIES: &str = "tracker_ranked_entries";
const RUN_DURATION: &str = "tracker_run_duration_seconds";

/// Add to a counter
pub fn increment(metric: CounterMetric, value: u64) {
    metrics::counter!(metric.name()).increment(value);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Record how many entries a report view holds
pub fn set_ranked_entries(view: &'static str, count: usize) {
    metrics::gauge!(RANKED_ENTRIES, "view" => view).set(count as f64);
}

/// Record wall-clock duration of a run
pub fn record_run_duration(duration: Duration) {
    metrics::histogram!(RUN_DURATION).record(duration.as_secs_f64());
}
