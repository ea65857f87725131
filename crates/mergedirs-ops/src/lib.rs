//! Merge engine for mergedirs.
//!
//! This crate executes merge targets against the filesystem: targets are
//! expanded into concrete jobs, then each job's tree is merged into its
//! destination under the target's conflict and overwrite-directory policies.
//!
//! ```rust,no_run
//! use mergedirs_core::{ConflictResolution, MergeDirsOptions, MergeTarget};
//! use mergedirs_ops::merge_dirs;
//!
//! # async fn run() -> Result<(), mergedirs_core::MergeError> {
//! let options = MergeDirsOptions::builder()
//!     .target(
//!         MergeTarget::new("packages/*/dist", "build")
//!             .with_conflict_resolution(ConflictResolution::Skip),
//!     )
//!     .ignore_errors(true)
//!     .build()
//!     .unwrap();
//!
//! let result = merge_dirs(options).await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

mod engine;
mod fs;
mod progress;

use std::sync::Arc;

use tokio::sync::mpsc;

use mergedirs_core::{MergeDirsOptions, MergeError, MergeResult};
use mergedirs_scan::{GlobScanner, PatternMatcher, collect_merge_targets};

pub use engine::MergeEngine;
pub use fs::{EntryKind, FileSystem, LocalFs};
pub use progress::MergeUpdate;

/// Default channel buffer size for merge progress updates.
pub const MERGE_CHANNEL_SIZE: usize = 100;

/// Merge every target of `options` on the local filesystem.
pub async fn merge_dirs(options: MergeDirsOptions) -> Result<MergeResult, MergeError> {
    merge_dirs_with(options, Arc::new(GlobScanner::new()), Arc::new(LocalFs::new())).await
}

/// Merge with substitute pattern matching and filesystem primitives.
pub async fn merge_dirs_with(
    options: MergeDirsOptions,
    matcher: Arc<dyn PatternMatcher>,
    fs: Arc<dyn FileSystem>,
) -> Result<MergeResult, MergeError> {
    run(options, matcher, fs, None).await
}

/// Start a merge in the background.
///
/// Returns a receiver for per-entry updates; the last update is always
/// [`MergeUpdate::Complete`].
pub fn start_merge(options: MergeDirsOptions) -> mpsc::Receiver<MergeUpdate> {
    let (tx, rx) = mpsc::channel(MERGE_CHANNEL_SIZE);

    tokio::spawn(async move {
        let result = run(
            options,
            Arc::new(GlobScanner::new()),
            Arc::new(LocalFs::new()),
            Some(tx.clone()),
        )
        .await;
        let _ = tx.send(MergeUpdate::Complete(result)).await;
    });

    rx
}

async fn run(
    options: MergeDirsOptions,
    matcher: Arc<dyn PatternMatcher>,
    fs: Arc<dyn FileSystem>,
    progress: Option<mpsc::Sender<MergeUpdate>>,
) -> Result<MergeResult, MergeError> {
    let resolved = options.resolve()?;

    let targets = resolved.targets.clone();
    let root = resolved.root.clone();
    let jobs = tokio::task::spawn_blocking(move || {
        collect_merge_targets(&targets, &root, matcher.as_ref())
    })
    .await
    .map_err(|e| MergeError::UnreadableRoot {
        path: resolved.root.clone(),
        source: std::io::Error::other(e),
    })??;

    let mut engine = MergeEngine::new(fs, &resolved);
    if let Some(tx) = progress {
        engine = engine.with_progress(tx);
    }
    engine.run(jobs).await
}
