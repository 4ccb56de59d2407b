//! war-activity-tracker: hourly activity report for Polymarket war markets
//!
//! This library provides the core components for:
//! - Market discovery via the Gamma API and price history from the CLOB
//! - Price moves, heat scores and volume spikes against the previous run
//! - Ranked top-N views with deterministic tie-breaking
//! - Atomic persistence of the report and the snapshot
//! - Structured logging and Prometheus metrics

pub mod activity;
pub mod cli;
pub mod config;
pub mod market;
pub mod pipeline;
pub mod store;
pub mod telemetry;
