//! Per-market state carried from one run to the next

use crate::market::MarketRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use thiserror::Error;

/// Snapshot construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Duplicate slug in snapshot: {0}")]
    DuplicateSlug(String),
    #[error("Invalid snapshot entry {slug}: {reason}")]
    InvalidEntry { slug: String, reason: String },
}

/// A market's state when the snapshot was taken
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    /// Reference outcome price, absent for untraded markets
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_24h: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// The previous run's state, keyed by slug
///
/// Slugs are unique: [`Snapshot::from_entries`] refuses duplicates and the
/// JSON form is an object keyed by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    markets: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    /// Empty snapshot taken at `timestamp`
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            markets: BTreeMap::new(),
        }
    }

    /// Build a snapshot, rejecting duplicated slugs
    pub fn from_entries(
        timestamp: DateTime<Utc>,
        entries: impl IntoIterator<Item = (String, SnapshotEntry)>,
    ) -> Result<Self, SnapshotError> {
        let mut markets = BTreeMap::new();
        for (slug, entry) in entries {
            match markets.entry(slug) {
                btree_map::Entry::Occupied(e) => {
                    return Err(SnapshotError::DuplicateSlug(e.key().clone()))
                }
                btree_map::Entry::Vacant(e) => {
                    e.insert(entry);
                }
            }
        }
        Ok(Self { timestamp, markets })
    }

    /// Snapshot of the current records, all stamped with `timestamp`
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a MarketRecord>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        Self::from_entries(
            timestamp,
            records.into_iter().map(|record| {
                (
                    record.slug.clone(),
                    SnapshotEntry {
                        price: record.last_trade_price,
                        volume_24h: record.volume_24h,
                        timestamp,
                    },
                )
            }),
        )
    }

    pub fn get(&self, slug: &str) -> Option<&SnapshotEntry> {
        self.markets.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.markets.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Entries in slug order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.markets.iter().map(|(slug, entry)| (slug.as_str(), entry))
    }
}

/// On-disk form; also reads snapshots from earlier tracker versions,
/// whose entries use `lastTradePrice`/`volume24hr` and carry no timestamp.
#[derive(Deserialize)]
struct RawSnapshot {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    markets: BTreeMap<String, RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default, alias = "lastTradePrice")]
    price: Option<Decimal>,
    #[serde(default, alias = "volume24hr")]
    volume_24h: Option<Decimal>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = SnapshotError;

    /// Entries with a negative volume or a price outside [0, 1] make the
    /// whole file invalid
    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let taken = raw.timestamp;
        let mut markets = BTreeMap::new();
        for (slug, entry) in raw.markets {
            let volume_24h = entry.volume_24h.unwrap_or_default();
            if volume_24h < Decimal::ZERO {
                return Err(SnapshotError::InvalidEntry {
                    slug,
                    reason: format!("negative volume_24h {}", volume_24h),
                });
            }
            if let Some(price) = entry.price {
                if price < Decimal::ZERO || price > Decimal::ONE {
                    return Err(SnapshotError::InvalidEntry {
                        slug,
                        reason: format!("price {} outside [0, 1]", price),
                    });
                }
            }
            markets.insert(
                slug,
                SnapshotEntry {
                    price: entry.price,
                    volume_24h,
                    timestamp: entry.timestamp.unwrap_or(taken),
                },
            );
        }
        Ok(Self {
            timestamp: taken,
            markets,
        })
    }
}
