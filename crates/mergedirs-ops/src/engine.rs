//! Recursive tree-walk merge over concrete jobs.
//!
//! Jobs run strictly sequentially, depth-first per job and in the order
//! given. Directory children are pushed on an explicit work stack so deep
//! trees do not grow the call stack.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use mergedirs_core::{
    ConcreteMergeJob, IoOperation, MergeError, MergeFailure, MergeRecord, MergeResult,
    Resolution, ResolvedMergeDirsOptions,
};

use crate::fs::{EntryKind, FileSystem};
use crate::progress::MergeUpdate;

/// Executes merge jobs against a [`FileSystem`] and aggregates outcomes.
pub struct MergeEngine {
    fs: Arc<dyn FileSystem>,
    ignore_errors: bool,
    ignore_empty_folders: bool,
    /// Caller-owned cancellation.
    cancel: CancellationToken,
    /// Force-terminate flag; also trips when `cancel` does.
    abort: CancellationToken,
    /// Absolute source paths already merged in this invocation.
    merged: HashSet<PathBuf>,
    /// Source directories known to hold at least one file.
    nonempty: HashSet<PathBuf>,
    result: MergeResult,
    fatal: Option<MergeError>,
    progress: Option<mpsc::Sender<MergeUpdate>>,
}

impl MergeEngine {
    /// Create an engine for one invocation.
    pub fn new(fs: Arc<dyn FileSystem>, options: &ResolvedMergeDirsOptions) -> Self {
        Self {
            fs,
            ignore_errors: options.ignore_errors,
            ignore_empty_folders: options.ignore_empty_folders,
            cancel: options.cancel.clone(),
            abort: options.cancel.child_token(),
            merged: HashSet::new(),
            nonempty: HashSet::new(),
            result: MergeResult::default(),
            fatal: None,
            progress: None,
        }
    }

    /// Report every merged and failed entry on `tx`.
    pub fn with_progress(mut self, tx: mpsc::Sender<MergeUpdate>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Run every job and return the aggregated report.
    ///
    /// An unignored failure stops all remaining work, including jobs of
    /// later targets, and yields [`MergeError::Aborted`] with the partial
    /// report.
    pub async fn run(mut self, jobs: Vec<ConcreteMergeJob>) -> Result<MergeResult, MergeError> {
        for job in jobs {
            if self.abort.is_cancelled() {
                break;
            }
            self.merge_tree(job).await;
        }
        self.finish()
    }

    fn finish(self) -> Result<MergeResult, MergeError> {
        if let Some(cause) = self.fatal {
            error!(error = %cause, "merge aborted");
            return Err(MergeError::Aborted {
                cause: Box::new(cause),
                partial: Box::new(self.result),
            });
        }
        if self.cancel.is_cancelled() {
            return Err(MergeError::Cancelled {
                partial: Box::new(self.result),
            });
        }
        Ok(self.result)
    }

    async fn merge_tree(&mut self, job: ConcreteMergeJob) {
        let mut stack = vec![job];

        while let Some(job) = stack.pop() {
            if self.abort.is_cancelled() {
                return;
            }

            let source = job.source_path();
            let dest = job.dest.clone();
            match self.merge_entry(job, &source).await {
                Ok(mut children) => {
                    children.reverse();
                    stack.extend(children);
                }
                Err(err) => self.fail(source, dest, err).await,
            }
        }
    }

    /// Merge a single entry. Returns the child jobs of a directory in merge mode.
    async fn merge_entry(
        &mut self,
        job: ConcreteMergeJob,
        source: &Path,
    ) -> Result<Vec<ConcreteMergeJob>, MergeError> {
        // A bulk-copied directory covers its whole subtree.
        if source.ancestors().any(|path| self.merged.contains(path)) {
            debug!(source = %source.display(), "already merged");
            return Ok(Vec::new());
        }

        let src = source.to_path_buf();
        let exists = self
            .blocking(IoOperation::Stat, source, move |fs| Ok(fs.exists(&src)))
            .await?;
        if !exists {
            debug!(source = %source.display(), "source vanished");
            return Ok(Vec::new());
        }

        let dest = job.dest.clone();
        let dest_exists = self
            .blocking(IoOperation::Stat, &job.dest, move |fs| Ok(fs.exists(&dest)))
            .await?;
        let job = if dest_exists {
            let resolution = job.conflict_resolver.resolve(source, &job.dest).await?;
            match resolution {
                Resolution::Skip => {
                    debug!(source = %source.display(), dest = %job.dest.display(), "skipped");
                    return Ok(Vec::new());
                }
                Resolution::Write(dest) => job.redirect(dest),
            }
        } else {
            job
        };

        let src = source.to_path_buf();
        match self.blocking(IoOperation::Stat, source, move |fs| fs.stat(&src)).await? {
            EntryKind::Directory => self.merge_directory(job, source).await,
            EntryKind::File => {
                self.merge_file(&job, source).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn merge_directory(
        &mut self,
        job: ConcreteMergeJob,
        source: &Path,
    ) -> Result<Vec<ConcreteMergeJob>, MergeError> {
        let src = source.to_path_buf();
        let mut names = self
            .blocking(IoOperation::ReadDir, source, move |fs| fs.read_dir(&src))
            .await?;
        names.sort();

        if self.ignore_empty_folders && !self.has_files(source, names.is_empty()).await? {
            debug!(source = %source.display(), "empty folder ignored");
            return Ok(Vec::new());
        }

        if job.overwrite_directory.applies(source, &job.dest) {
            let dest = job.dest.clone();
            self.blocking(IoOperation::Remove, &job.dest, move |fs| fs.remove_all(&dest))
                .await?;

            let (src, dest) = (source.to_path_buf(), job.dest.clone());
            let bytes = self
                .blocking(IoOperation::CopyTree, source, move |fs| fs.copy_tree(&src, &dest))
                .await?;

            debug!(
                source = %source.display(),
                dest = %job.dest.display(),
                "directory overwritten"
            );
            self.succeed(source, &job.dest, bytes).await;
            return Ok(Vec::new());
        }

        let dest = job.dest.clone();
        self.blocking(IoOperation::CreateDir, &job.dest, move |fs| fs.create_dir_all(&dest))
            .await?;
        debug!(
            source = %source.display(),
            dest = %job.dest.display(),
            entries = names.len(),
            "merging directory"
        );

        Ok(names.iter().map(|name| job.child(name)).collect())
    }

    /// Whether the subtree under `source` holds a file.
    ///
    /// Every directory between `source` and the first file found is cached,
    /// so nested directories on that path are not scanned again.
    async fn has_files(&mut self, source: &Path, is_empty: bool) -> Result<bool, MergeError> {
        if is_empty {
            return Ok(false);
        }
        if self.nonempty.contains(source) {
            return Ok(true);
        }

        let src = source.to_path_buf();
        let found = self
            .blocking(IoOperation::ReadDir, source, move |fs| find_file(fs, &src))
            .await?;
        let Some(file) = found else {
            return Ok(false);
        };

        for dir in file.ancestors().skip(1) {
            if !dir.starts_with(source) {
                break;
            }
            self.nonempty.insert(dir.to_path_buf());
        }
        Ok(true)
    }

    async fn merge_file(
        &mut self,
        job: &ConcreteMergeJob,
        source: &Path,
    ) -> Result<(), MergeError> {
        if let Some(parent) = job.dest.parent() {
            let parent = parent.to_path_buf();
            let dir = parent.clone();
            self.blocking(IoOperation::CreateDir, &parent, move |fs| fs.create_dir_all(&dir))
                .await?;
        }

        let (src, dest) = (source.to_path_buf(), job.dest.clone());
        let bytes = self
            .blocking(IoOperation::CopyFile, source, move |fs| fs.copy_file(&src, &dest))
            .await?;

        debug!(source = %source.display(), dest = %job.dest.display(), bytes, "file copied");
        self.succeed(source, &job.dest, bytes).await;
        Ok(())
    }

    async fn succeed(&mut self, source: &Path, dest: &Path, bytes: u64) {
        self.merged.insert(source.to_path_buf());
        let record = MergeRecord::new(source, dest);
        self.result.record_success(record.clone(), bytes);

        if let Some(tx) = &self.progress {
            let _ = tx.send(MergeUpdate::Merged(record)).await;
        }
    }

    async fn fail(&mut self, source: PathBuf, dest: PathBuf, err: MergeError) {
        warn!(source = %source.display(), dest = %dest.display(), error = %err, "merge failed");
        let failure = MergeFailure::new(source, dest, err.to_string());
        self.result.record_failure(failure.clone());

        if let Some(tx) = &self.progress {
            let _ = tx.send(MergeUpdate::Failed(failure)).await;
        }

        if !self.ignore_errors {
            if self.fatal.is_none() {
                self.fatal = Some(err);
            }
            self.abort.cancel();
        }
    }

    /// Run a filesystem primitive on the blocking pool.
    async fn blocking<T, F>(
        &self,
        operation: IoOperation,
        path: &Path,
        f: F,
    ) -> Result<T, MergeError>
    where
        F: FnOnce(&dyn FileSystem) -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let fs = Arc::clone(&self.fs);
        tokio::task::spawn_blocking(move || f(fs.as_ref()))
            .await
            .map_err(|e| MergeError::io(operation, path, io::Error::other(e)))?
            .map_err(|e| MergeError::io(operation, path, e))
    }
}

/// First non-directory entry found under `dir`, if any.
fn find_file(fs: &dyn FileSystem, dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for name in fs.read_dir(&current)? {
            let path = current.join(name);
            match fs.stat(&path)? {
                EntryKind::File => return Ok(Some(path)),
                EntryKind::Directory => stack.push(path),
            }
        }
    }

    Ok(None)
}
