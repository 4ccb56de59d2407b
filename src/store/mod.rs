//! Flat-file persistence for the snapshot and the activity report

mod atomic;
mod report;
mod snapshot;

pub use atomic::{write_atomic, write_json_atomic};
pub use report::ReportWriter;
pub use snapshot::SnapshotStore;

use std::path::PathBuf;
use thiserror::Error;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}
