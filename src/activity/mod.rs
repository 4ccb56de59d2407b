//! Activity computation
//!
//! Turns the current markets, their price histories and the previous run's
//! snapshot into six ranked views and the snapshot for the next run.

mod engine;
mod metrics;
mod ranking;
mod report;
mod snapshot;

pub use engine::{ActivityEngine, ActivityOutcome, Histories};
pub use metrics::{
    heat_score, price_at_or_before, HeatScore, MarketMetrics, MoveWindow, PriceMove, VolumeSpike,
};
pub use report::{ActivityReport, MarketSummary, RankedEntry, VolumeMetric};
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotError};
