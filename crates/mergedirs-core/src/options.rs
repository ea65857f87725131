//! Merge options and their normalized form.

use std::path::PathBuf;

use derive_builder::Builder;
use tokio_util::sync::CancellationToken;

use crate::error::MergeError;
use crate::policy::{ConflictResolution, ConflictResolver, OverwriteDirectory};

/// One merge intent: everything matching `src` under the root, excluding
/// `ignore`, merges into `dest`.
#[derive(Debug, Clone)]
pub struct MergeTarget {
    /// Destination directory, resolved against the working directory when relative.
    pub dest: PathBuf,
    /// Source paths or glob patterns, relative to the root.
    pub src: Vec<String>,
    /// Glob patterns excluded from the match.
    pub ignore: Vec<String>,
    /// Drop the matched entry's directory structure.
    pub flatten: bool,
    /// Whether existing destination directories are replaced wholesale.
    pub overwrite_directory: OverwriteDirectory,
    /// How existing destination entries are resolved.
    pub conflict_resolution: ConflictResolution,
}

impl MergeTarget {
    /// Create a target merging a single pattern into `dest`.
    pub fn new(src: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self::with_patterns(vec![src.into()], dest)
    }

    /// Create a target merging several patterns into `dest`.
    pub fn with_patterns<I, S>(src: I, dest: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dest: dest.into(),
            src: src.into_iter().map(Into::into).collect(),
            ignore: Vec::new(),
            flatten: true,
            overwrite_directory: OverwriteDirectory::Never,
            conflict_resolution: ConflictResolution::Overwrite,
        }
    }

    /// Exclude matches of these patterns.
    pub fn with_ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }

    /// Keep or drop the matched directory structure.
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Set the overwrite-directory policy.
    pub fn with_overwrite_directory(mut self, policy: impl Into<OverwriteDirectory>) -> Self {
        self.overwrite_directory = policy.into();
        self
    }

    /// Set the conflict resolution policy.
    pub fn with_conflict_resolution(mut self, resolution: impl Into<ConflictResolution>) -> Self {
        self.conflict_resolution = resolution.into();
        self
    }
}

/// A target whose conflict policy has been mapped to a resolver.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub dest: PathBuf,
    pub src: Vec<String>,
    pub ignore: Vec<String>,
    pub flatten: bool,
    pub overwrite_directory: OverwriteDirectory,
    pub conflict_resolver: ConflictResolver,
}

/// Options for one merge invocation.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MergeDirsOptions {
    /// Directory patterns are matched against (None = working directory).
    #[builder(default, setter(strip_option))]
    pub root: Option<PathBuf>,

    /// Targets to merge, processed in order.
    pub targets: Vec<MergeTarget>,

    /// Record failures and keep going instead of aborting.
    #[builder(default = "false")]
    pub ignore_errors: bool,

    /// Do not create destination directories for sources without files.
    #[builder(default = "false")]
    pub ignore_empty_folders: bool,

    /// External cancellation, checked before every job.
    #[builder(default, setter(strip_option))]
    pub cancel: Option<CancellationToken>,
}

impl MergeDirsOptionsBuilder {
    /// Append a single target.
    pub fn target(&mut self, target: MergeTarget) -> &mut Self {
        self.targets.get_or_insert_with(Vec::new).push(target);
        self
    }

    fn validate(&self) -> Result<(), String> {
        let Some(targets) = &self.targets else {
            return Err("At least one target is required".to_string());
        };
        if targets.is_empty() {
            return Err("At least one target is required".to_string());
        }
        for target in targets {
            if target.src.is_empty() || target.src.iter().any(|p| p.is_empty()) {
                return Err(format!(
                    "Target for {} has an empty source pattern",
                    target.dest.display()
                ));
            }
            if target.dest.as_os_str().is_empty() {
                return Err("Target destination cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl MergeDirsOptions {
    /// Create a new options builder.
    pub fn builder() -> MergeDirsOptionsBuilder {
        MergeDirsOptionsBuilder::default()
    }

    /// Create options for a list of targets with all defaults.
    pub fn new(targets: Vec<MergeTarget>) -> Self {
        Self {
            root: None,
            targets,
            ignore_errors: false,
            ignore_empty_folders: false,
            cancel: None,
        }
    }

    /// Apply defaults and map policy names onto resolver functions.
    pub fn resolve(self) -> Result<ResolvedMergeDirsOptions, MergeError> {
        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().map_err(|source| MergeError::UnreadableRoot {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let targets = self
            .targets
            .into_iter()
            .map(|target| {
                let dest = std::path::absolute(&target.dest).map_err(|e| {
                    MergeError::invalid_config(format!(
                        "Cannot resolve destination {}: {e}",
                        target.dest.display()
                    ))
                })?;
                Ok(ResolvedTarget {
                    dest,
                    src: target.src,
                    ignore: target.ignore,
                    flatten: target.flatten,
                    overwrite_directory: target.overwrite_directory,
                    conflict_resolver: target.conflict_resolution.into_resolver(),
                })
            })
            .collect::<Result<Vec<_>, MergeError>>()?;

        Ok(ResolvedMergeDirsOptions {
            root,
            targets,
            ignore_errors: self.ignore_errors,
            ignore_empty_folders: self.ignore_empty_folders,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// Options with every default applied.
#[derive(Debug, Clone)]
pub struct ResolvedMergeDirsOptions {
    pub root: PathBuf,
    pub targets: Vec<ResolvedTarget>,
    pub ignore_errors: bool,
    pub ignore_empty_folders: bool,
    pub cancel: CancellationToken,
}
