//! Activity engine: metrics, ranked views and the next snapshot
//!
//! Pure computation over one run's inputs. No I/O, no clock reads; `now`
//! is passed in so identical inputs give identical output.

use super::metrics::{HeatScore, MarketMetrics, PriceMove, VolumeSpike};
use super::ranking::{rank, Candidate};
use super::report::{ActivityReport, RankedEntry, VolumeMetric};
use super::snapshot::{Snapshot, SnapshotError};
use crate::config::{MoverMetric, ReportConfig};
use crate::market::{MarketRecord, PriceHistoryPoint};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Price histories keyed by slug; a missing key means the fetch failed
pub type Histories = HashMap<String, Vec<PriceHistoryPoint>>;

/// Result of one engine run
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    pub report: ActivityReport,
    /// Replaces the previous snapshot wholesale
    pub snapshot: Snapshot,
}

/// Computes the activity report and next snapshot
#[derive(Debug, Clone)]
pub struct ActivityEngine {
    config: ReportConfig,
}

impl ActivityEngine {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Rank the current markets against `previous`
    ///
    /// Markets only present in `previous` are ignored. A slug repeated in
    /// `markets` keeps its first record.
    pub fn compute(
        &self,
        markets: &[MarketRecord],
        histories: &Histories,
        previous: Option<&Snapshot>,
        now: DateTime<Utc>,
    ) -> Result<ActivityOutcome, SnapshotError> {
        let markets = unique_by_slug(markets);

        let scored: Vec<(&MarketRecord, MarketMetrics)> = markets
            .iter()
            .map(|&record| {
                let history = histories.get(&record.slug).map(Vec::as_slice);
                let prior = previous.and_then(|s| s.get(&record.slug));
                (record, MarketMetrics::compute(record, history, prior, now))
            })
            .collect();

        let report = ActivityReport {
            generated_at: now,
            previous_snapshot: previous.map(|s| s.timestamp),
            total_markets: markets.len(),
            top_volume_24h: self.volume_view(&scored, |m| m.volume_24h),
            top_volume_total: self.volume_view(&scored, |m| m.volume_total),
            hottest_markets: self.hottest_view(&scored),
            top_movers_1h: self.mover_view(&scored, |m| m.move_1h),
            top_movers_24h: self.mover_view(&scored, |m| m.move_24h),
            volume_spikes: self.spike_view(&scored),
        };

        let snapshot = Snapshot::from_records(markets.iter().copied(), now)?;

        tracing::debug!(
            markets = report.total_markets,
            hottest = report.hottest_markets.len(),
            movers_1h = report.top_movers_1h.len(),
            movers_24h = report.top_movers_24h.len(),
            spikes = report.volume_spikes.len(),
            "Computed activity views"
        );

        Ok(ActivityOutcome { report, snapshot })
    }

    fn volume_view(
        &self,
        scored: &[(&MarketRecord, MarketMetrics)],
        volume: impl Fn(&MarketRecord) -> Decimal,
    ) -> Vec<RankedEntry<VolumeMetric>> {
        let candidates = scored
            .iter()
            .filter(|(m, _)| !self.config.exclude_zero_volume || volume(m) > Decimal::ZERO)
            .map(|&(m, _)| Candidate {
                market: m,
                sort_key: volume(m),
                metric: VolumeMetric::default(),
            })
            .collect();
        rank(candidates, self.config.top_n)
    }

    fn hottest_view(
        &self,
        scored: &[(&MarketRecord, MarketMetrics)],
    ) -> Vec<RankedEntry<HeatScore>> {
        let floor = self.config.hot_min_volume_total.max(Decimal::ZERO);
        let candidates = scored
            .iter()
            .filter(|(m, _)| m.volume_total > floor)
            .filter_map(|(m, metrics)| {
                metrics.heat.map(|heat_score| Candidate {
                    market: *m,
                    sort_key: heat_score,
                    metric: HeatScore { heat_score },
                })
            })
            .collect();
        rank(candidates, self.config.top_n)
    }

    fn mover_view(
        &self,
        scored: &[(&MarketRecord, MarketMetrics)],
        window: impl Fn(&MarketMetrics) -> Option<PriceMove>,
    ) -> Vec<RankedEntry<PriceMove>> {
        let candidates = scored
            .iter()
            .filter_map(|(m, metrics)| {
                let price_move = window(metrics)?;
                let magnitude = match self.config.mover_metric {
                    MoverMetric::Points => price_move.points_change.abs(),
                    MoverMetric::Percent => price_move.pct_change?.abs(),
                };
                Some(Candidate {
                    market: *m,
                    sort_key: magnitude,
                    metric: price_move,
                })
            })
            .collect();
        rank(candidates, self.config.top_n)
    }

    fn spike_view(
        &self,
        scored: &[(&MarketRecord, MarketMetrics)],
    ) -> Vec<RankedEntry<VolumeSpike>> {
        let candidates = scored
            .iter()
            .filter_map(|(m, metrics)| {
                let spike = metrics.spike?;
                if let Some(min) = self.config.spike_min_delta {
                    if spike.volume_spike < min {
                        return None;
                    }
                }
                Some(Candidate {
                    market: *m,
                    sort_key: spike.volume_spike,
                    metric: spike,
                })
            })
            .collect();
        rank(candidates, self.config.top_n)
    }
}

/// First record per slug, in input order
fn unique_by_slug(markets: &[MarketRecord]) -> Vec<&MarketRecord> {
    let mut seen = HashSet::new();
    markets
        .iter()
        .filter(|&record| {
            let first = seen.insert(record.slug.as_str());
            if !first {
                tracing::warn!(slug = %record.slug, "Duplicate market in fetch, keeping the first");
            }
            first
        })
        .collect()
}
