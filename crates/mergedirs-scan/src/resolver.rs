//! Target resolution: declarative targets into concrete merge jobs.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use mergedirs_core::{ConcreteMergeJob, MergeError, ResolvedTarget};

use crate::matcher::PatternMatcher;

/// Expand every target's patterns against `root` into concrete jobs.
///
/// Jobs are emitted target by target, in match order. Fails before any job
/// runs when a pattern is invalid or the root cannot be read.
pub fn collect_merge_targets(
    targets: &[ResolvedTarget],
    root: &Path,
    matcher: &dyn PatternMatcher,
) -> Result<Vec<ConcreteMergeJob>, MergeError> {
    let root = canonical_root(root)?;
    let mut jobs = Vec::new();

    for target in targets {
        let matched = matcher.matches(&target.src, &target.ignore, &root)?;
        info!(
            patterns = ?target.src,
            dest = %target.dest.display(),
            matches = matched.len(),
            "expanded merge target"
        );

        for src in matched {
            let dest = destination_for(&src, &target.dest, target.flatten);
            debug!(src = %src.display(), dest = %dest.display(), "merge job");
            jobs.push(ConcreteMergeJob {
                root: root.clone(),
                src,
                dest,
                overwrite_directory: target.overwrite_directory.clone(),
                conflict_resolver: target.conflict_resolver.clone(),
            });
        }
    }

    Ok(jobs)
}

/// Compute where a matched path lands under `dest`.
///
/// Flattened matches go directly under `dest`. Otherwise the first segment
/// of the match's parent directory is replaced by `dest` and deeper nesting
/// is kept: `pkg/sub/file.txt` lands at `dest/sub/file.txt`.
pub fn destination_for(matched: &Path, dest: &Path, flatten: bool) -> PathBuf {
    let Some(name) = matched.file_name() else {
        return dest.to_path_buf();
    };

    let parent = matched.parent().filter(|p| !p.as_os_str().is_empty());
    let dest_dir = match parent {
        Some(dir) if !flatten => dest.join(dir.components().skip(1).collect::<PathBuf>()),
        _ => dest.to_path_buf(),
    };

    dest_dir.join(name)
}

fn canonical_root(root: &Path) -> Result<PathBuf, MergeError> {
    let canonical = root
        .canonicalize()
        .map_err(|source| MergeError::UnreadableRoot {
            path: root.to_path_buf(),
            source,
        })?;

    if !canonical.is_dir() {
        return Err(MergeError::UnreadableRoot {
            path: canonical,
            source: std::io::Error::from(std::io::ErrorKind::NotADirectory),
        });
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_drops_structure() {
        let dest = destination_for(Path::new("pkg/sub/file.txt"), Path::new("/out"), true);
        assert_eq!(dest, PathBuf::from("/out/file.txt"));
    }

    #[test]
    fn test_preserve_replaces_first_segment() {
        let dest = destination_for(Path::new("pkg/sub/file.txt"), Path::new("/out"), false);
        assert_eq!(dest, PathBuf::from("/out/sub/file.txt"));

        let dest = destination_for(Path::new("pkg/a/b/c.txt"), Path::new("/out"), false);
        assert_eq!(dest, PathBuf::from("/out/a/b/c.txt"));
    }

    #[test]
    fn test_preserve_single_level() {
        let dest = destination_for(Path::new("pkg/file.txt"), Path::new("/out"), false);
        assert_eq!(dest, PathBuf::from("/out/file.txt"));
    }

    #[test]
    fn test_no_parent_goes_under_dest() {
        let dest = destination_for(Path::new("file.txt"), Path::new("/out"), false);
        assert_eq!(dest, PathBuf::from("/out/file.txt"));
    }

    #[test]
    fn test_root_itself_maps_to_dest() {
        assert_eq!(
            destination_for(Path::new("."), Path::new("/out"), true),
            PathBuf::from("/out")
        );
    }

    #[test]
    fn test_missing_root() {
        let err = canonical_root(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.is_target_resolution());
    }
}
