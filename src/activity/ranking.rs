//! Top-N ranking with deterministic tie-breaks

use super::report::{MarketSummary, RankedEntry};
use crate::market::MarketRecord;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A market eligible for a view, with the value it is ranked by
#[derive(Debug, Clone)]
pub struct Candidate<'a, M> {
    pub market: &'a MarketRecord,
    /// Larger ranks higher
    pub sort_key: Decimal,
    pub metric: M,
}

/// Descending by key, then ascending by slug
fn compare<M>(a: &Candidate<'_, M>, b: &Candidate<'_, M>) -> Ordering {
    b.sort_key
        .cmp(&a.sort_key)
        .then_with(|| a.market.slug.cmp(&b.market.slug))
}

/// Sort, keep the first `top_n` and number them from 1
pub fn rank<M>(mut candidates: Vec<Candidate<'_, M>>, top_n: usize) -> Vec<RankedEntry<M>> {
    candidates.sort_by(compare);
    candidates.truncate(top_n);
    candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| RankedEntry {
            market: MarketSummary::from(candidate.market),
            metric: candidate.metric,
            rank: idx + 1,
        })
        .collect()
}
