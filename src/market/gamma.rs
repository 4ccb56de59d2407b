//! Gamma API client for market discovery
//!
//! Pages through the open markets filed under one tag and converts them to
//! [`MarketRecord`]s. Markets that cannot be converted are logged and
//! skipped; a failed page fails the whole fetch.

use super::{FetchError, MarketRecord, RetryPolicy};
use crate::config::{ApiConfig, GAMMA_API_URL};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Safety stop for pagination
const MAX_PAGES: usize = 200;

const ENDPOINT: &str = "gamma /markets";

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Tag the tracked markets are filed under
    pub tag_id: String,
    /// Markets per page
    pub page_size: usize,
    /// Pages fetched before giving up on a listing that never ends
    pub max_pages: usize,
    pub retry: RetryPolicy,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            tag_id: crate::config::DEFAULT_TAG_ID.to_string(),
            page_size: 100,
            max_pages: MAX_PAGES,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&ApiConfig> for GammaConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.gamma_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(api.timeout_secs),
            tag_id: api.tag_id.clone(),
            page_size: api.page_size,
            max_pages: MAX_PAGES,
            retry: RetryPolicy {
                max_retries: api.max_retries,
                backoff: Duration::from_millis(api.retry_backoff_ms),
            },
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a client with custom configuration
    pub fn with_config(config: GammaConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Fetch every open market under the configured tag
    ///
    /// Pages until a short page. A failed page, or `max_pages` full pages,
    /// fails the whole fetch; a partial list is never returned.
    pub async fn fetch_tagged_markets(&self) -> Result<Vec<MarketRecord>, FetchError> {
        let mut records = Vec::new();
        let mut offset = 0usize;
        let mut complete = false;

        for page_no in 0..self.config.max_pages {
            let page = self.fetch_page(offset).await?;
            let page_len = page.len();

            tracing::debug!(
                page = page_no,
                offset,
                markets = page_len,
                "Fetched Gamma markets page"
            );

            for raw in page {
                match serde_json::from_value::<GammaMarket>(raw) {
                    Ok(gamma) => match gamma.into_record() {
                        Ok(record) => records.push(record),
                        Err(reason) => {
                            tracing::warn!(reason = %reason, "Skipping unusable market")
                        }
                    },
                    Err(e) => tracing::warn!(error = %e, "Skipping undecodable market"),
                }
            }

            if page_len < self.config.page_size {
                complete = true;
                break;
            }
            offset += self.config.page_size;
        }

        if !complete {
            tracing::warn!(
                pages = self.config.max_pages,
                markets = records.len(),
                "Page limit reached with more markets pending"
            );
            return Err(FetchError::TooManyPages {
                endpoint: ENDPOINT,
                pages: self.config.max_pages,
            });
        }

        tracing::info!(
            tag = %self.config.tag_id,
            markets = records.len(),
            "Fetched tracked markets"
        );

        Ok(records)
    }

    async fn fetch_page(&self, offset: usize) -> Result<Vec<serde_json::Value>, FetchError> {
        let url = format!("{}/markets", self.config.base_url);
        let limit = self.config.page_size.to_string();
        let offset = offset.to_string();
        let query = [
            ("tag_id", self.config.tag_id.as_str()),
            ("related_tags", "true"),
            ("closed", "false"),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];
        let (client, url, query) = (&self.client, url.as_str(), &query);

        self.config
            .retry
            .run("gamma markets", || async move {
                let response = client.get(url).query(query).send().await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(FetchError::Status {
                        endpoint: ENDPOINT,
                        status,
                        body,
                    });
                }

                let body: serde_json::Value = response.json().await?;
                match body {
                    serde_json::Value::Array(items) => Ok(items),
                    other => Err(FetchError::Decode {
                        endpoint: ENDPOINT,
                        reason: format!("expected an array, got {}", json_kind(&other)),
                    }),
                }
            })
            .await
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Raw market response from Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    slug: Option<String>,
    #[serde(default)]
    question: Option<String>,
    /// Trailing 24h volume
    #[serde(default)]
    volume24hr: Option<Decimal>,
    /// All-time volume as a number
    #[serde(default)]
    volume_num: Option<Decimal>,
    /// All-time volume as a string, older payloads only carry this one
    #[serde(default)]
    volume: Option<Decimal>,
    #[serde(default)]
    last_trade_price: Option<Decimal>,
    /// CLOB token IDs as JSON string
    #[serde(default)]
    clob_token_ids: Option<String>,
    /// Outcome labels as JSON string
    #[serde(default)]
    outcomes: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

impl GammaMarket {
    fn into_record(self) -> Result<MarketRecord, super::RecordError> {
        let outcomes = self
            .outcomes
            .as_deref()
            .and_then(parse_string_list)
            .unwrap_or_default();
        let reference_token_id = self
            .clob_token_ids
            .as_deref()
            .and_then(parse_string_list)
            .and_then(|tokens| reference_token(&tokens, &outcomes));

        MarketRecord {
            slug: self.slug.unwrap_or_default(),
            question: self.question.unwrap_or_default(),
            volume_24h: self.volume24hr.unwrap_or_default(),
            volume_total: self.volume_num.or(self.volume).unwrap_or_default(),
            last_trade_price: self.last_trade_price,
            reference_token_id,
            end_date: self.end_date,
            outcomes,
        }
        .validated()
    }
}

/// Parse a JSON-encoded string list, e.g. `"[\"Yes\", \"No\"]"`
fn parse_string_list(raw: &str) -> Option<Vec<String>> {
    serde_json::from_str(raw).ok()
}

/// Token of the "Yes" outcome, falling back to the first token
fn reference_token(tokens: &[String], outcomes: &[String]) -> Option<String> {
    let idx = outcomes
        .iter()
        .position(|o| o.eq_ignore_ascii_case("yes"))
        .unwrap_or(0);
    tokens.get(idx).or_else(|| tokens.first()).cloned()
}
