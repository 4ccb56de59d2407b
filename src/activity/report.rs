//! Activity report: the public JSON document read by visualization clients
//!
//! Field names are part of the contract and must not change.

use super::metrics::{HeatScore, PriceMove, VolumeSpike};
use crate::market::MarketRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write as _;

/// Market fields repeated in every ranked entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub slug: String,
    pub question: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_24h: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_total: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub last_trade_price: Option<Decimal>,
    pub end_date: Option<String>,
    pub outcomes: Vec<String>,
}

impl From<&MarketRecord> for MarketSummary {
    fn from(record: &MarketRecord) -> Self {
        Self {
            slug: record.slug.clone(),
            question: record.question.clone(),
            volume_24h: record.volume_24h,
            volume_total: record.volume_total,
            last_trade_price: record.last_trade_price,
            end_date: record.end_date.clone(),
            outcomes: record.outcomes.clone(),
        }
    }
}

/// Metric of the volume views, whose values already sit in [`MarketSummary`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VolumeMetric {}

/// One row of a ranked view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry<M> {
    #[serde(flatten)]
    pub market: MarketSummary,
    #[serde(flatten)]
    pub metric: M,
    /// 1-based position within the view
    pub rank: usize,
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityReport {
    pub generated_at: DateTime<Utc>,
    /// Timestamp of the snapshot deltas were computed against
    pub previous_snapshot: Option<DateTime<Utc>>,
    pub total_markets: usize,
    pub top_volume_24h: Vec<RankedEntry<VolumeMetric>>,
    pub top_volume_total: Vec<RankedEntry<VolumeMetric>>,
    pub hottest_markets: Vec<RankedEntry<HeatScore>>,
    pub top_movers_1h: Vec<RankedEntry<PriceMove>>,
    pub top_movers_24h: Vec<RankedEntry<PriceMove>>,
    pub volume_spikes: Vec<RankedEntry<VolumeSpike>>,
}

impl ActivityReport {
    /// Slugs of every view, in order, for comparing rankings between runs
    pub fn view_orderings(&self) -> [(&'static str, Vec<&str>); 6] {
        fn slugs<M>(entries: &[RankedEntry<M>]) -> Vec<&str> {
            entries.iter().map(|e| e.market.slug.as_str()).collect()
        }
        [
            ("top_volume_24h", slugs(&self.top_volume_24h)),
            ("top_volume_total", slugs(&self.top_volume_total)),
            ("hottest_markets", slugs(&self.hottest_markets)),
            ("top_movers_1h", slugs(&self.top_movers_1h)),
            ("top_movers_24h", slugs(&self.top_movers_24h)),
            ("volume_spikes", slugs(&self.volume_spikes)),
        ]
    }

    /// Human-readable digest of the first `limit` rows of each view
    pub fn format_summary(&self, limit: usize) -> String {
        let mut out = String::new();
        let previous = self
            .previous_snapshot
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "none (first run)".to_string());

        let _ = writeln!(out, "══════════════════════════════════════════════════════");
        let _ = writeln!(out, "               MARKET ACTIVITY");
        let _ = writeln!(out, "══════════════════════════════════════════════════════");
        let _ = writeln!(out, "Generated:        {}", self.generated_at.to_rfc3339());
        let _ = writeln!(out, "Previous run:     {}", previous);
        let _ = writeln!(out, "Markets tracked:  {}", self.total_markets);

        section(&mut out, "TOP 24H VOLUME", &self.top_volume_24h, limit, |e| {
            format!("${:.0}", e.market.volume_24h)
        });
        section(&mut out, "HOTTEST (24H / TOTAL VOLUME)", &self.hottest_markets, limit, |e| {
            format!("{:.1}%", e.metric.heat_score)
        });
        section(&mut out, "MOVERS 1H", &self.top_movers_1h, limit, mover_line);
        section(&mut out, "MOVERS 24H", &self.top_movers_24h, limit, mover_line);
        section(&mut out, "VOLUME SPIKES (SINCE LAST RUN)", &self.volume_spikes, limit, |e| {
            format!("{:+.0}", e.metric.volume_spike)
        });

        let _ = writeln!(out, "══════════════════════════════════════════════════════");
        out
    }
}

fn mover_line(entry: &RankedEntry<PriceMove>) -> String {
    let arrow = if entry.metric.points_change.is_sign_negative() {
        "↓"
    } else {
        "↑"
    };
    format!(
        "{} {:.1}pp ({:.0}%)",
        arrow,
        entry.metric.points_change.abs(),
        entry.metric.current_price
    )
}

fn section<M>(
    out: &mut String,
    title: &str,
    entries: &[RankedEntry<M>],
    limit: usize,
    value: impl Fn(&RankedEntry<M>) -> String,
) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "───────────────────────────────────────────────────────");
    if entries.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    for entry in entries.iter().take(limit) {
        let _ = writeln!(
            out,
            "  {:>2}. {:<16} {}",
            entry.rank,
            value(entry),
            truncate(&entry.market.question, 60)
        );
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
