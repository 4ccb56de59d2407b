//! Market discovery module
//!
//! Fetches the tracked war markets from the Gamma API and the reference
//! token's price history from the CLOB API.

mod clob;
mod fetcher;
mod gamma;
mod retry;

pub use clob::{ClobClient, ClobConfig};
pub use fetcher::PolymarketFetcher;
pub use gamma::{GammaClient, GammaConfig};
pub use retry::RetryPolicy;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tracked Polymarket market as seen in the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    /// Stable market identifier
    pub slug: String,
    /// Display question
    pub question: String,
    /// Trading volume over the trailing 24 hours
    pub volume_24h: Decimal,
    /// All-time trading volume
    pub volume_total: Decimal,
    /// Last traded price of the reference outcome, absent for untraded markets
    pub last_trade_price: Option<Decimal>,
    /// CLOB token of the reference ("Yes") outcome
    pub reference_token_id: Option<String>,
    pub end_date: Option<String>,
    pub outcomes: Vec<String>,
}

/// Reasons a market record is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("market has no slug")]
    MissingSlug,
    #[error("negative volume")]
    NegativeVolume,
    #[error("last trade price {0} outside [0, 1]")]
    PriceOutOfRange(Decimal),
}

impl MarketRecord {
    /// Check field ranges and repair `volume_total < volume_24h`
    pub fn validated(mut self) -> Result<Self, RecordError> {
        if self.slug.trim().is_empty() {
            return Err(RecordError::MissingSlug);
        }
        if self.volume_24h < Decimal::ZERO || self.volume_total < Decimal::ZERO {
            return Err(RecordError::NegativeVolume);
        }
        if let Some(price) = self.last_trade_price {
            if price < Decimal::ZERO || price > Decimal::ONE {
                return Err(RecordError::PriceOutOfRange(price));
            }
        }
        if self.volume_total < self.volume_24h {
            tracing::debug!(
                slug = %self.slug,
                volume_24h = %self.volume_24h,
                volume_total = %self.volume_total,
                "All-time volume below 24h volume, raising it"
            );
            self.volume_total = self.volume_24h;
        }
        Ok(self)
    }
}

/// One point of a reference token's price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// Errors talking to the upstream APIs
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },
    #[error("Market {0} has no reference token")]
    MissingToken(String),
    #[error("{endpoint} still returned full pages after {pages} pages")]
    TooManyPages { endpoint: &'static str, pages: usize },
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Decode { .. }
            | FetchError::MissingToken(_)
            | FetchError::TooManyPages { .. } => false,
        }
    }
}

/// Source of market records and price histories
#[async_trait]
pub trait MarketFetcher: Send + Sync {
    /// Fetch every open market under the tracked tag
    async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, FetchError>;
    /// Fetch the reference token's price history up to `now`
    async fn fetch_price_history(
        &self,
        market: &MarketRecord,
        now: DateTime<Utc>,
    ) -> Result<Vec<PriceHistoryPoint>, FetchError>;
}
