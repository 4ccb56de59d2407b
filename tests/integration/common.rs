//! Shared fixtures for integration tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use war_activity_tracker::market::{FetchError, MarketFetcher, MarketRecord, PriceHistoryPoint};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn market(slug: &str, volume_24h: Decimal, volume_total: Decimal, price: Decimal) -> MarketRecord {
    MarketRecord {
        slug: slug.to_string(),
        question: format!("Will {slug} happen?"),
        volume_24h,
        volume_total,
        last_trade_price: Some(price),
        reference_token_id: Some(format!("{slug}-yes")),
        end_date: Some("2025-12-31T00:00:00Z".to_string()),
        outcomes: vec!["Yes".to_string(), "No".to_string()],
    }
}

pub fn point(at: DateTime<Utc>, hours_ago: i64, price: Decimal) -> PriceHistoryPoint {
    PriceHistoryPoint {
        timestamp: at - Duration::hours(hours_ago),
        price,
    }
}

/// In-memory fetcher; markets without a history entry fail their history fetch
#[derive(Clone, Default)]
pub struct MockFetcher {
    markets: Option<Vec<MarketRecord>>,
    histories: HashMap<String, Vec<PriceHistoryPoint>>,
    token_histories: HashMap<String, Vec<PriceHistoryPoint>>,
    history_calls: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn with_markets(markets: Vec<MarketRecord>) -> Self {
        Self {
            markets: Some(markets),
            ..Default::default()
        }
    }

    /// Fetcher whose market list request always fails
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn history(mut self, slug: &str, points: Vec<PriceHistoryPoint>) -> Self {
        self.histories.insert(slug.to_string(), points);
        self
    }

    /// History served for a reference token, ahead of any per-slug history
    pub fn token_history(mut self, token: &str, points: Vec<PriceHistoryPoint>) -> Self {
        self.token_histories.insert(token.to_string(), points);
        self
    }

    pub fn history_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.history_calls)
    }
}

#[async_trait]
impl MarketFetcher for MockFetcher {
    async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, FetchError> {
        self.markets.clone().ok_or_else(|| FetchError::Status {
            endpoint: "gamma markets",
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "maintenance".to_string(),
        })
    }

    async fn fetch_price_history(
        &self,
        market: &MarketRecord,
        _now: DateTime<Utc>,
    ) -> Result<Vec<PriceHistoryPoint>, FetchError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        market
            .reference_token_id
            .as_ref()
            .and_then(|token| self.token_histories.get(token))
            .or_else(|| self.histories.get(&market.slug))
            .cloned()
            .ok_or_else(|| FetchError::Decode {
                endpoint: "clob prices-history",
                reason: "missing history".to_string(),
            })
    }
}
