//! Concrete merge jobs produced by target resolution.

use std::ffi::OsStr;
use std::path::PathBuf;

use crate::policy::{ConflictResolver, OverwriteDirectory};

/// One matched filesystem entry and where it merges to.
#[derive(Debug, Clone)]
pub struct ConcreteMergeJob {
    /// Directory `src` is relative to.
    pub root: PathBuf,
    /// Matched path, relative to `root`.
    pub src: PathBuf,
    /// Destination path for the entry.
    pub dest: PathBuf,
    pub overwrite_directory: OverwriteDirectory,
    pub conflict_resolver: ConflictResolver,
}

impl ConcreteMergeJob {
    /// Absolute source path.
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.src)
    }

    /// Job for a directory entry named `name` inside this job's source.
    pub fn child(&self, name: &OsStr) -> Self {
        Self {
            root: self.root.clone(),
            src: self.src.join(name),
            dest: self.dest.join(name),
            overwrite_directory: self.overwrite_directory.clone(),
            conflict_resolver: self.conflict_resolver.clone(),
        }
    }

    /// The same job writing to a different destination.
    pub fn redirect(self, dest: PathBuf) -> Self {
        Self { dest, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ConcreteMergeJob {
        ConcreteMergeJob {
            root: PathBuf::from("/work"),
            src: PathBuf::from("pkg/sub"),
            dest: PathBuf::from("/out/sub"),
            overwrite_directory: OverwriteDirectory::Always,
            conflict_resolver: ConflictResolver::skip(),
        }
    }

    #[test]
    fn test_source_path() {
        assert_eq!(job().source_path(), PathBuf::from("/work/pkg/sub"));
    }

    #[test]
    fn test_child_keeps_policies() {
        let child = job().child(OsStr::new("file.txt"));
        assert_eq!(child.root, PathBuf::from("/work"));
        assert_eq!(child.src, PathBuf::from("pkg/sub/file.txt"));
        assert_eq!(child.dest, PathBuf::from("/out/sub/file.txt"));
        assert!(matches!(child.overwrite_directory, OverwriteDirectory::Always));
        assert_eq!(child.conflict_resolver.name(), "skip");
    }
}
