//! Core types and policies for mergedirs.
//!
//! This crate provides the data model shared by the target resolver and the
//! merge engine: merge targets and options, conflict and overwrite-directory
//! policies, concrete merge jobs, and the merge report.

mod config;
mod error;
mod job;
mod options;
mod policy;
mod result;

pub use config::{MergeConfig, Patterns, TargetConfig};
pub use error::{IoOperation, MergeError};
pub use job::ConcreteMergeJob;
pub use options::{
    MergeDirsOptions, MergeDirsOptionsBuilder, MergeTarget, ResolvedMergeDirsOptions,
    ResolvedTarget,
};
pub use policy::{
    ConflictResolution, ConflictResolver, OverwriteDirectory, Resolution, ResolverFuture,
};
pub use result::{MergeFailure, MergeRecord, MergeResult};

/// Re-exported so callers can cancel a merge without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
