//! Progress updates for merge operations.

use mergedirs_core::{MergeError, MergeFailure, MergeRecord, MergeResult};

/// Update sent through the channel while a merge runs.
#[derive(Debug)]
pub enum MergeUpdate {
    /// An entry was merged.
    Merged(MergeRecord),
    /// An entry failed to merge.
    Failed(MergeFailure),
    /// The merge finished, was aborted, or was cancelled.
    Complete(Result<MergeResult, MergeError>),
}

impl MergeUpdate {
    /// Check if this is the final update.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}
