//! Per-market activity metrics
//!
//! Every metric is `None` when its inputs are missing. A missing price or
//! volume is never read as zero, since zero is a valid value for both.

use super::snapshot::SnapshotEntry;
use crate::market::{MarketRecord, PriceHistoryPoint};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

const HUNDRED: Decimal = dec!(100);

/// Price of the latest point at or before `target`
///
/// Does not assume the history is sorted.
pub fn price_at_or_before(
    history: &[PriceHistoryPoint],
    target: DateTime<Utc>,
) -> Option<Decimal> {
    history
        .iter()
        .filter(|point| point.timestamp <= target)
        .max_by_key(|point| point.timestamp)
        .map(|point| point.price)
}

/// Offset a price move is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveWindow {
    OneHour,
    OneDay,
}

impl MoveWindow {
    pub fn duration(self) -> Duration {
        match self {
            MoveWindow::OneHour => Duration::hours(1),
            MoveWindow::OneDay => Duration::hours(24),
        }
    }

    /// Report key of the price at the start of the window
    pub fn price_ago_key(self) -> &'static str {
        match self {
            MoveWindow::OneHour => "price_1h_ago",
            MoveWindow::OneDay => "price_24h_ago",
        }
    }
}

/// Price change over a fixed offset, in percentage points
///
/// Serializes the starting price under the window's own key
/// (`price_1h_ago` or `price_24h_ago`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceMove {
    pub window: MoveWindow,
    /// Current price, 0-100
    pub current_price: Decimal,
    /// Price at the start of the window, 0-100
    pub price_ago: Decimal,
    pub points_change: Decimal,
    /// Relative change in percent, undefined from a zero price
    pub pct_change: Option<Decimal>,
}

impl PriceMove {
    /// Move from `previous` to `current`, both as 0-1 prices
    pub fn between(window: MoveWindow, previous: Decimal, current: Decimal) -> Self {
        let price_ago = previous * HUNDRED;
        let current_price = current * HUNDRED;
        let points_change = current_price - price_ago;
        let pct_change = if price_ago.is_zero() {
            None
        } else {
            points_change
                .checked_div(price_ago)
                .and_then(|ratio| ratio.checked_mul(HUNDRED))
        };

        Self {
            window,
            current_price,
            price_ago,
            points_change,
            pct_change,
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct Float(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Serialize for PriceMove {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("current_price", &Float(self.current_price))?;
        map.serialize_entry(self.window.price_ago_key(), &Float(self.price_ago))?;
        map.serialize_entry("points_change", &Float(self.points_change))?;
        map.serialize_entry("pct_change", &self.pct_change.map(Float))?;
        map.end()
    }
}

/// 24h volume as a percentage of all-time volume
pub fn heat_score(volume_24h: Decimal, volume_total: Decimal) -> Option<Decimal> {
    if volume_total <= Decimal::ZERO {
        return None;
    }
    volume_24h
        .checked_div(volume_total)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
}

/// `heat_score` as it appears in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatScore {
    #[serde(with = "rust_decimal::serde::float")]
    pub heat_score: Decimal,
}

/// Change in 24h volume since the previous snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeSpike {
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_spike: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub previous_volume_24h: Decimal,
    /// Relative change in percent, undefined from zero volume
    #[serde(with = "rust_decimal::serde::float_option")]
    pub volume_spike_pct: Option<Decimal>,
}

impl VolumeSpike {
    /// Spike against the prior entry; `None` for markets new since the snapshot
    pub fn against(current_volume_24h: Decimal, prior: Option<&SnapshotEntry>) -> Option<Self> {
        let previous = prior?.volume_24h;
        let delta = current_volume_24h.checked_sub(previous)?;
        let pct = if previous.is_zero() {
            None
        } else {
            delta
                .checked_div(previous)
                .and_then(|ratio| ratio.checked_mul(HUNDRED))
        };
        Some(Self {
            volume_spike: delta,
            previous_volume_24h: previous,
            volume_spike_pct: pct,
        })
    }
}

/// Everything the ranked views need for one market
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketMetrics {
    pub move_1h: Option<PriceMove>,
    pub move_24h: Option<PriceMove>,
    pub heat: Option<Decimal>,
    pub spike: Option<VolumeSpike>,
}

impl MarketMetrics {
    /// Compute metrics for `record` at `now`
    ///
    /// `history` is `None` when the history fetch failed. The current price
    /// is the record's last trade price, or the latest history point when
    /// the market has never traded.
    pub fn compute(
        record: &MarketRecord,
        history: Option<&[PriceHistoryPoint]>,
        prior: Option<&SnapshotEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        let current = record
            .last_trade_price
            .or_else(|| history.and_then(|h| price_at_or_before(h, now)));

        let move_over = |window: MoveWindow| -> Option<PriceMove> {
            let previous = price_at_or_before(history?, now - window.duration())?;
            Some(PriceMove::between(window, previous, current?))
        };

        Self {
            move_1h: move_over(MoveWindow::OneHour),
            move_24h: move_over(MoveWindow::OneDay),
            heat: heat_score(record.volume_24h, record.volume_total),
            spike: VolumeSpike::against(record.volume_24h, prior),
        }
    }
}
