//! Polymarket-backed market fetcher

use super::{
    ClobClient, ClobConfig, FetchError, GammaClient, GammaConfig, MarketFetcher, MarketRecord,
    PriceHistoryPoint,
};
use crate::config::ApiConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Fetches markets from Gamma and price histories from the CLOB
pub struct PolymarketFetcher {
    gamma: GammaClient,
    clob: ClobClient,
}

impl PolymarketFetcher {
    /// Create a fetcher from explicit client configurations
    pub fn new(gamma: GammaConfig, clob: ClobConfig) -> Result<Self, FetchError> {
        Ok(Self {
            gamma: GammaClient::with_config(gamma)?,
            clob: ClobClient::with_config(clob)?,
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, FetchError> {
        Self::new(GammaConfig::from(api), ClobConfig::from(api))
    }
}

#[async_trait]
impl MarketFetcher for PolymarketFetcher {
    async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, FetchError> {
        self.gamma.fetch_tagged_markets().await
    }

    async fn fetch_price_history(
        &self,
        market: &MarketRecord,
        now: DateTime<Utc>,
    ) -> Result<Vec<PriceHistoryPoint>, FetchError> {
        let token_id = market
            .reference_token_id
            .as_deref()
            .ok_or_else(|| FetchError::MissingToken(market.slug.clone()))?;
        self.clob.fetch_price_history(token_id, now).await
    }
}
