//! Integration tests for configuration loading

use war_activity_tracker::config::{Config, LogFormat, MoverMetric, DEFAULT_TAG_ID};

#[test]
fn test_example_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();
    let defaults = Config::default();

    assert_eq!(config.api.tag_id, DEFAULT_TAG_ID);
    assert_eq!(config.api.gamma_url, defaults.api.gamma_url);
    assert_eq!(config.api.page_size, defaults.api.page_size);
    assert_eq!(config.api.request_delay_ms, defaults.api.request_delay_ms);
    assert_eq!(config.report.top_n, defaults.report.top_n);
    assert_eq!(config.report.mover_metric, MoverMetric::Points);
    assert_eq!(config.storage.report_path, defaults.storage.report_path);
    assert_eq!(config.storage.snapshot_path, defaults.storage.snapshot_path);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.telemetry.metrics_path.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[report]\ntop_n = 3\nmover_metric = \"percent\"\n\n[storage]\nreport_path = \"r.json\"\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.report.top_n, 3);
    assert_eq!(config.report.mover_metric, MoverMetric::Percent);
    assert_eq!(config.storage.report_path.to_str(), Some("r.json"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[report\ntop_n = ").unwrap();

    assert!(Config::load(&path).is_err());
}
