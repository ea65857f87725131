//! Merge outcome types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A source entry that was merged into its destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// Absolute source path.
    pub source: PathBuf,
    /// Path the source was written to.
    pub dest: PathBuf,
}

impl MergeRecord {
    /// Create a new record.
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

/// A source entry that could not be merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeFailure {
    /// Absolute source path.
    pub source: PathBuf,
    /// Destination the merge was attempting to write.
    pub dest: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl MergeFailure {
    /// Create a new failure entry.
    pub fn new(
        source: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for MergeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.source.display(),
            self.dest.display(),
            self.message
        )
    }
}

/// Outcome of a whole merge invocation, accumulated across every target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Entries merged successfully, in processing order.
    pub successes: Vec<MergeRecord>,
    /// Entries that failed, in processing order.
    pub errors: Vec<MergeFailure>,
    /// Total bytes copied.
    pub bytes_copied: u64,
}

impl MergeResult {
    /// Record a successful merge of `bytes` bytes.
    pub fn record_success(&mut self, record: MergeRecord, bytes: u64) {
        self.bytes_copied += bytes;
        self.successes.push(record);
    }

    /// Record a failed merge.
    pub fn record_failure(&mut self, failure: MergeFailure) {
        self.errors.push(failure);
    }

    /// Check if every attempted entry succeeded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            format!("Merged {} items", self.successes.len())
        } else {
            format!(
                "Merged {} items, {} failed",
                self.successes.len(),
                self.errors.len()
            )
        }
    }
}
