//! Glob matching and target resolution for mergedirs.
//!
//! This crate turns declarative merge targets into concrete merge jobs.
//! Pattern expansion sits behind the [`PatternMatcher`] trait; the default
//! [`GlobScanner`] walks the filesystem with jwalk and matches with globset.
//!
//! # Example
//!
//! ```rust,no_run
//! use mergedirs_core::{MergeDirsOptions, MergeTarget};
//! use mergedirs_scan::{GlobScanner, collect_merge_targets};
//!
//! let options = MergeDirsOptions::new(vec![MergeTarget::new("packages/*/dist", "build")])
//!     .resolve()
//!     .unwrap();
//! let jobs = collect_merge_targets(&options.targets, &options.root, &GlobScanner::new()).unwrap();
//!
//! for job in &jobs {
//!     println!("{} -> {}", job.src.display(), job.dest.display());
//! }
//! ```

mod matcher;
mod resolver;

pub use matcher::{GlobScanner, PatternMatcher};
pub use resolver::{collect_merge_targets, destination_for};
