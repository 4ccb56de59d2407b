//! CLOB API client for reference-token price history

use super::{FetchError, PriceHistoryPoint, RetryPolicy};
use crate::config::{ApiConfig, CLOB_API_URL};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the CLOB client
#[derive(Debug, Clone)]
pub struct ClobConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Minutes between returned points
    pub fidelity_mins: u32,
    /// How far back history is requested
    pub lookback: ChronoDuration,
    pub retry: RetryPolicy,
}

impl Default for ClobConfig {
    fn default() -> Self {
        Self {
            base_url: CLOB_API_URL.to_string(),
            timeout: Duration::from_secs(15),
            fidelity_mins: 5,
            lookback: ChronoDuration::hours(25),
            retry: RetryPolicy::none(),
        }
    }
}

impl From<&ApiConfig> for ClobConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.clob_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(api.history_timeout_secs),
            fidelity_mins: api.history_fidelity_mins,
            lookback: ChronoDuration::hours(i64::from(api.history_lookback_hours)),
            retry: RetryPolicy {
                max_retries: api.max_retries,
                backoff: Duration::from_millis(api.retry_backoff_ms),
            },
        }
    }
}

/// Client for Polymarket's CLOB price history endpoint
pub struct ClobClient {
    config: ClobConfig,
    client: Client,
}

impl ClobClient {
    pub fn with_config(config: ClobConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Fetch the price history of `token_id` for the lookback window ending at `now`
    pub async fn fetch_price_history(
        &self,
        token_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PriceHistoryPoint>, FetchError> {
        let url = format!("{}/prices-history", self.config.base_url);
        let start_ts = (now - self.config.lookback).timestamp().to_string();
        let end_ts = now.timestamp().to_string();
        let fidelity = self.config.fidelity_mins.to_string();
        let query = [
            ("market", token_id),
            ("startTs", start_ts.as_str()),
            ("endTs", end_ts.as_str()),
            ("fidelity", fidelity.as_str()),
        ];
        let (client, url, query) = (&self.client, url.as_str(), &query);

        let response: PriceHistoryResponse = self
            .config
            .retry
            .run("clob prices-history", || async move {
                let response = client.get(url).query(query).send().await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(FetchError::Status {
                        endpoint: "clob /prices-history",
                        status,
                        body,
                    });
                }

                response.json().await.map_err(|e| FetchError::Decode {
                    endpoint: "clob /prices-history",
                    reason: e.to_string(),
                })
            })
            .await?;

        Ok(response.into_points())
    }
}

#[derive(Debug, Deserialize)]
struct PriceHistoryResponse {
    #[serde(default)]
    history: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    /// Unix seconds
    t: i64,
    p: Decimal,
}

impl PriceHistoryResponse {
    /// Drop points with an invalid timestamp or a price outside [0, 1]
    fn into_points(self) -> Vec<PriceHistoryPoint> {
        self.history
            .into_iter()
            .filter(|raw| raw.p >= Decimal::ZERO && raw.p <= Decimal::ONE)
            .filter_map(|raw| {
                DateTime::from_timestamp(raw.t, 0).map(|timestamp| PriceHistoryPoint {
                    timestamp,
                    price: raw.p,
                })
            })
            .collect()
    }
}
