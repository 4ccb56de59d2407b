//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{
    increment, record_run_duration, set_gauge, set_ranked_entries, CounterMetric, GaugeMetric,
};

use crate::config::TelemetryConfig;
use crate::store::{write_atomic, StoreError};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::PathBuf;

/// Holds the metrics exporter for the lifetime of the process
pub struct TelemetryGuard {
    exporter: Option<(PrometheusHandle, PathBuf)>,
}

impl TelemetryGuard {
    /// Write the current metrics to the configured text file, if any
    pub fn export_metrics(&self) -> Result<(), StoreError> {
        if let Some((handle, path)) = &self.exporter {
            write_atomic(path, handle.render().as_bytes())?;
            tracing::debug!(path = %path.display(), "Exported metrics");
        }
        Ok(())
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    let exporter = match &config.metrics_path {
        Some(path) => {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
            Some((handle, path.clone()))
        }
        None => None,
    };

    Ok(TelemetryGuard { exporter })
}
