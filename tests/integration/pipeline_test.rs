//! End-to-end runs against an in-memory fetcher

use crate::common::{market, now, point, MockFetcher};
use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::Ordering;
use war_activity_tracker::activity::ActivityEngine;
use war_activity_tracker::config::ReportConfig;
use war_activity_tracker::pipeline::Pipeline;
use war_activity_tracker::store::{ReportWriter, SnapshotStore};

fn pipeline(fetcher: MockFetcher, report: &Path, snapshot: &Path) -> Pipeline<MockFetcher> {
    Pipeline::new(
        fetcher,
        ActivityEngine::new(ReportConfig::default()),
        SnapshotStore::new(snapshot),
        ReportWriter::new(report),
    )
}

fn first_run_fetcher() -> MockFetcher {
    let at = now();
    MockFetcher::with_markets(vec![
        market("kyiv-ceasefire", dec!(1000), dec!(10000), dec!(0.325)),
        market("crimea-bridge", dec!(500), dec!(1000), dec!(0.5)),
        market("zero-volume", dec!(0), dec!(0), dec!(0.1)),
    ])
    .history(
        "kyiv-ceasefire",
        vec![point(at, 25, dec!(0.20)), point(at, 2, dec!(0.28))],
    )
    .history(
        "crimea-bridge",
        vec![point(at, 25, dec!(0.6)), point(at, 2, dec!(0.5))],
    )
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn slugs(view: &Value) -> Vec<&str> {
    view.as_array()
        .unwrap()
        .iter()
        .map(|e| e["slug"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_first_run_writes_report_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("activity.json");
    let snapshot_path = dir.path().join("snapshot.json");

    let summary = pipeline(first_run_fetcher(), &report_path, &snapshot_path)
        .run(now())
        .await
        .unwrap();

    assert_eq!(summary.history_failures, 1);
    assert!(summary.snapshot_saved);

    let report = read_json(&report_path);
    assert_eq!(report["total_markets"], 3);
    assert!(report["previous_snapshot"].is_null());
    assert_eq!(
        slugs(&report["top_volume_24h"]),
        vec!["kyiv-ceasefire", "crimea-bridge", "zero-volume"]
    );
    assert_eq!(
        slugs(&report["hottest_markets"]),
        vec!["crimea-bridge", "kyiv-ceasefire"]
    );
    assert!(report["volume_spikes"].as_array().unwrap().is_empty());

    let top_1h = &report["top_movers_1h"][0];
    assert_eq!(top_1h["slug"], "kyiv-ceasefire");
    assert_eq!(top_1h["rank"], 1);
    assert_eq!(top_1h["price_1h_ago"].as_f64(), Some(28.0));
    assert_eq!(top_1h["current_price"].as_f64(), Some(32.5));
    assert_eq!(top_1h["points_change"].as_f64(), Some(4.5));

    // 20 -> 32.5 outranks 60 -> 50 by magnitude
    assert_eq!(
        slugs(&report["top_movers_24h"]),
        vec!["kyiv-ceasefire", "crimea-bridge"]
    );
    assert_eq!(report["top_movers_24h"][1]["points_change"].as_f64(), Some(-10.0));
    assert_eq!(report["top_movers_24h"][1]["price_24h_ago"].as_f64(), Some(60.0));
    assert!(report["top_movers_24h"][1].get("price_1h_ago").is_none());

    let snapshot = SnapshotStore::new(&snapshot_path).load().unwrap();
    assert_eq!(snapshot.timestamp, now());
    assert_eq!(snapshot.len(), 3);
}

#[tokio::test]
async fn test_second_run_reports_spikes_and_overwrites_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("activity.json");
    let snapshot_path = dir.path().join("snapshot.json");

    pipeline(first_run_fetcher(), &report_path, &snapshot_path)
        .run(now())
        .await
        .unwrap();

    let later = now() + Duration::hours(1);
    let second = MockFetcher::with_markets(vec![
        market("kyiv-ceasefire", dec!(1600), dec!(10600), dec!(0.33)),
        market("crimea-bridge", dec!(400), dec!(1000), dec!(0.5)),
        market("new-offensive", dec!(900), dec!(900), dec!(0.05)),
    ]);
    let summary = pipeline(second, &report_path, &snapshot_path)
        .run(later)
        .await
        .unwrap();
    assert_eq!(summary.history_failures, 3);

    let report = read_json(&report_path);
    assert_eq!(report["previous_snapshot"], "2025-03-01T12:00:00Z");

    let spikes = &report["volume_spikes"];
    assert_eq!(slugs(spikes), vec!["kyiv-ceasefire", "crimea-bridge"]);
    assert_eq!(spikes[0]["volume_spike"].as_f64(), Some(600.0));
    assert_eq!(spikes[0]["previous_volume_24h"].as_f64(), Some(1000.0));
    assert_eq!(spikes[0]["volume_spike_pct"].as_f64(), Some(60.0));
    assert_eq!(spikes[1]["volume_spike"].as_f64(), Some(-100.0));

    // no histories this run
    assert!(report["top_movers_1h"].as_array().unwrap().is_empty());

    let snapshot = SnapshotStore::new(&snapshot_path).load().unwrap();
    assert_eq!(snapshot.timestamp, later);
    assert!(snapshot.contains("new-offensive"));
    assert!(!snapshot.contains("zero-volume"));
}

#[tokio::test]
async fn test_market_list_failure_is_fatal_and_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("activity.json");
    let snapshot_path = dir.path().join("snapshot.json");

    pipeline(first_run_fetcher(), &report_path, &snapshot_path)
        .run(now())
        .await
        .unwrap();
    let report_before = std::fs::read(&report_path).unwrap();
    let snapshot_before = std::fs::read(&snapshot_path).unwrap();

    let fetcher = MockFetcher::unavailable();
    let calls = fetcher.history_calls();
    let result = pipeline(fetcher, &report_path, &snapshot_path)
        .run(now() + Duration::hours(1))
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read(&report_path).unwrap(), report_before);
    assert_eq!(std::fs::read(&snapshot_path).unwrap(), snapshot_before);
}

#[tokio::test]
async fn test_report_write_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();
    let report_path = blocker.join("activity.json");
    let snapshot_path = dir.path().join("snapshot.json");

    let result = pipeline(first_run_fetcher(), &report_path, &snapshot_path)
        .run(now())
        .await;

    assert!(result.is_err());
    assert!(!snapshot_path.exists());
}

#[tokio::test]
async fn test_snapshot_write_failure_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();
    let report_path = dir.path().join("activity.json");
    let snapshot_path = blocker.join("snapshot.json");

    let summary = pipeline(first_run_fetcher(), &report_path, &snapshot_path)
        .run(now())
        .await
        .unwrap();

    assert!(!summary.snapshot_saved);
    assert!(report_path.exists());
}

#[tokio::test]
async fn test_corrupt_snapshot_treated_as_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("activity.json");
    let snapshot_path = dir.path().join("snapshot.json");
    std::fs::write(&snapshot_path, "{\"timestamp\": 12").unwrap();

    pipeline(first_run_fetcher(), &report_path, &snapshot_path)
        .run(now())
        .await
        .unwrap();

    let report = read_json(&report_path);
    assert!(report["previous_snapshot"].is_null());
    assert!(report["volume_spikes"].as_array().unwrap().is_empty());
    assert_eq!(SnapshotStore::new(&snapshot_path).load().unwrap().len(), 3);
}

#[tokio::test]
async fn test_identical_runs_give_identical_reports() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    pipeline(first_run_fetcher(), &first, &dir.path().join("s1.json"))
        .run(now())
        .await
        .unwrap();
    pipeline(first_run_fetcher(), &second, &dir.path().join("s2.json"))
        .run(now())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&first).unwrap(),
        std::fs::read_to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_every_market_gets_a_history_request() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = first_run_fetcher();
    let calls = fetcher.history_calls();

    pipeline(
        fetcher,
        &dir.path().join("activity.json"),
        &dir.path().join("snapshot.json"),
    )
    .with_request_delay(std::time::Duration::from_millis(1))
    .run(now())
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_duplicate_slug_uses_first_record_history() {
    let dir = tempfile::tempdir().unwrap();
    let at = now();
    let mut first = market("dup", dec!(100), dec!(1000), dec!(0.5));
    first.reference_token_id = Some("tok-a".to_string());
    let mut second = market("dup", dec!(900), dec!(9000), dec!(0.9));
    second.reference_token_id = Some("tok-b".to_string());

    let fetcher = MockFetcher::with_markets(vec![first, second])
        .token_history("tok-a", vec![point(at, 2, dec!(0.5))])
        .token_history("tok-b", vec![point(at, 2, dec!(0.1))]);
    let calls = fetcher.history_calls();
    let report_path = dir.path().join("activity.json");

    let summary = pipeline(fetcher, &report_path, &dir.path().join("snapshot.json"))
        .run(at)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.history_failures, 0);

    let report = read_json(&report_path);
    assert_eq!(report["total_markets"], 1);
    let mover = &report["top_movers_1h"][0];
    assert_eq!(mover["slug"], "dup");
    assert_eq!(mover["points_change"].as_f64(), Some(0.0));
    assert_eq!(report["top_volume_24h"][0]["volume_24h"].as_f64(), Some(100.0));
}
