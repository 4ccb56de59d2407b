//! Configuration types for the activity tracker

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";
/// CLOB API base URL
pub const CLOB_API_URL: &str = "https://clob.polymarket.com";
/// Gamma tag the tracked war markets are filed under
pub const DEFAULT_TAG_ID: &str = "ukraine-map";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,

    #[serde(default = "default_clob_url")]
    pub clob_url: String,

    /// Gamma tag used to select the tracked markets
    #[serde(default = "default_tag_id")]
    pub tag_id: String,

    /// Markets requested per Gamma page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Timeout for market list requests (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for price history requests (seconds)
    #[serde(default = "default_history_timeout_secs")]
    pub history_timeout_secs: u64,

    /// Extra attempts after a failed request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between attempts, doubled each retry (milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Pause between consecutive price history requests (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Minutes between price history points
    #[serde(default = "default_history_fidelity_mins")]
    pub history_fidelity_mins: u32,

    /// How far back price history is requested (hours)
    #[serde(default = "default_history_lookback_hours")]
    pub history_lookback_hours: u32,
}

fn default_gamma_url() -> String {
    GAMMA_API_URL.to_string()
}
fn default_clob_url() -> String {
    CLOB_API_URL.to_string()
}
fn default_tag_id() -> String {
    DEFAULT_TAG_ID.to_string()
}
fn default_page_size() -> usize {
    100
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_history_timeout_secs() -> u64 {
    15
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_request_delay_ms() -> u64 {
    100
}
fn default_history_fidelity_mins() -> u32 {
    5
}
fn default_history_lookback_hours() -> u32 {
    25 // one hour of slack so the 24h offset always has a point
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            clob_url: default_clob_url(),
            tag_id: default_tag_id(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            history_timeout_secs: default_history_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_delay_ms: default_request_delay_ms(),
            history_fidelity_mins: default_history_fidelity_mins(),
            history_lookback_hours: default_history_lookback_hours(),
        }
    }
}

/// Which change the mover views are ranked by
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MoverMetric {
    /// Absolute percentage-point change
    #[default]
    Points,
    /// Absolute relative change
    Percent,
}

/// Ranking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Entries kept per ranked view
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub mover_metric: MoverMetric,

    /// Markets at or below this all-time volume are left out of `hottest_markets`
    #[serde(default)]
    pub hot_min_volume_total: Decimal,

    /// Minimum 24h volume increase for `volume_spikes`
    #[serde(default)]
    pub spike_min_delta: Option<Decimal>,

    /// Leave markets with zero volume out of the volume views
    #[serde(default)]
    pub exclude_zero_volume: bool,
}

fn default_top_n() -> usize {
    10
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            mover_metric: MoverMetric::default(),
            hot_min_volume_total: Decimal::ZERO,
            spike_min_delta: None,
            exclude_zero_volume: false,
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_report_path() -> PathBuf {
    PathBuf::from("polymarket-activity.json")
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from("price-history.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus text file written at the end of each run
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides on top of file values
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("GAMMA_API_URL") {
            self.api.gamma_url = v;
        }
        if let Some(v) = lookup("CLOB_API_URL") {
            self.api.clob_url = v;
        }
        if let Some(v) = lookup("ACTIVITY_TAG_ID") {
            self.api.tag_id = v;
        }
        if let Some(v) = lookup("ACTIVITY_TOP_N") {
            self.report.top_n = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "ACTIVITY_TOP_N",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("ACTIVITY_OUTPUT_FILE") {
            self.storage.report_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ACTIVITY_SNAPSHOT_FILE") {
            self.storage.snapshot_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.telemetry.log_level = v;
        }
        Ok(())
    }

    /// Reject values the run cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.top_n == 0 {
            return Err(ConfigError::Invalid("report.top_n must be at least 1".into()));
        }
        if self.api.page_size == 0 {
            return Err(ConfigError::Invalid("api.page_size must be at least 1".into()));
        }
        if self.api.tag_id.trim().is_empty() {
            return Err(ConfigError::Invalid("api.tag_id must not be empty".into()));
        }
        if self.api.history_lookback_hours < 24 {
            return Err(ConfigError::Invalid(
                "api.history_lookback_hours must cover the 24h offset".into(),
            ));
        }
        Ok(())
    }
}
