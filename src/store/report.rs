//! Activity report writer

use super::{write_json_atomic, StoreError};
use crate::activity::ActivityReport;
use std::path::{Path, PathBuf};

/// Writes the activity report document
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the report file with `report`
    pub fn write(&self, report: &ActivityReport) -> Result<(), StoreError> {
        write_json_atomic(&self.path, report)?;
        tracing::info!(path = %self.path.display(), "Saved activity report");
        Ok(())
    }
}
