//! Snapshot file store

use super::{write_json_atomic, StoreError};
use crate::activity::Snapshot;
use std::path::{Path, PathBuf};

/// Loads and saves the snapshot document
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot
    ///
    /// A missing, unreadable or malformed file yields `None`, the same as a
    /// first run.
    pub fn load(&self) -> Option<Snapshot> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No previous snapshot (first run)");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not read previous snapshot, starting fresh"
                );
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => {
                tracing::info!(
                    path = %self.path.display(),
                    taken_at = %snapshot.timestamp,
                    markets = snapshot.len(),
                    "Loaded previous snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Previous snapshot is corrupt, starting fresh"
                );
                None
            }
        }
    }

    /// Replace the stored snapshot
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        write_json_atomic(&self.path, snapshot)?;
        tracing::info!(
            path = %self.path.display(),
            markets = snapshot.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}
