//! Glob expansion over the filesystem.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use indexmap::IndexSet;
use jwalk::WalkDir;

use mergedirs_core::MergeError;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Expands source patterns into matched paths.
///
/// Matches cover files and directories, include dotfiles, and are returned
/// in a deterministic order: relative to `cwd`, or absolute for absolute
/// patterns.
pub trait PatternMatcher: Send + Sync {
    fn matches(
        &self,
        patterns: &[String],
        ignore: &[String],
        cwd: &Path,
    ) -> Result<Vec<PathBuf>, MergeError>;
}

/// Pattern matcher walking the filesystem with jwalk.
#[derive(Debug, Clone, Default)]
pub struct GlobScanner {
    follow_links: bool,
}

impl GlobScanner {
    /// Create a scanner that does not follow symlinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symlinked directories while walking.
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Walk from the pattern's literal prefix and collect matching entries.
    fn walk_pattern(
        &self,
        pattern: &str,
        ignore: &GlobSet,
        cwd: &Path,
        out: &mut IndexSet<PathBuf>,
    ) -> Result<(), MergeError> {
        let components: Vec<&str> = pattern.split('/').collect();
        let literal = components
            .iter()
            .take_while(|c| !c.contains(GLOB_META))
            .count();

        if literal == components.len() {
            let rel = PathBuf::from(pattern);
            if cwd.join(&rel).symlink_metadata().is_ok() && !is_ignored(ignore, &rel) {
                out.insert(rel);
            }
            return Ok(());
        }

        let matcher = compile(pattern)?.compile_matcher();
        let absolute = Path::new(pattern).is_absolute();
        let base = match components[..literal].join("/") {
            prefix if prefix.is_empty() && absolute => PathBuf::from("/"),
            prefix => PathBuf::from(prefix),
        };
        let walk_root = cwd.join(&base);
        if !walk_root.is_dir() {
            return Ok(());
        }

        let max_depth = if pattern.contains("**") {
            usize::MAX
        } else {
            components.len() - literal
        };

        let prune = ignore.clone();
        let prune_cwd = cwd.to_path_buf();
        let walker = WalkDir::new(&walk_root)
            .sort(true)
            .skip_hidden(false)
            .follow_links(self.follow_links)
            .min_depth(1)
            .max_depth(max_depth)
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|entry| match entry {
                    Ok(entry) => {
                        let rel = relative_to(&entry.path(), &prune_cwd);
                        !prune.is_match(to_slash(&rel))
                    }
                    Err(_) => true,
                });
            });

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| walk_root.clone());
                    return Err(MergeError::UnreadableRoot {
                        path,
                        source: std::io::Error::other(err.to_string()),
                    });
                }
            };

            // Absolute patterns match and report absolute paths.
            let path = entry.path();
            let rel = relative_to(&path, cwd);
            let candidate = if absolute { path } else { rel.clone() };
            if is_match(&matcher, &candidate) && !is_ignored(ignore, &rel) {
                out.insert(candidate);
            }
        }

        Ok(())
    }
}

impl PatternMatcher for GlobScanner {
    fn matches(
        &self,
        patterns: &[String],
        ignore: &[String],
        cwd: &Path,
    ) -> Result<Vec<PathBuf>, MergeError> {
        let ignore = build_globset(ignore)?;
        let mut matched = IndexSet::new();

        for pattern in patterns {
            let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
            self.walk_pattern(pattern, &ignore, cwd, &mut matched)?;
        }

        Ok(matched.into_iter().collect())
    }
}

/// Compile a pattern with `*` confined to a single path segment.
fn compile(pattern: &str) -> Result<globset::Glob, MergeError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| MergeError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, MergeError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
        builder.add(compile(pattern)?);
    }
    builder.build().map_err(|e| MergeError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

fn is_match(matcher: &GlobMatcher, rel: &Path) -> bool {
    matcher.is_match(to_slash(rel))
}

/// Whether `rel` or any of its ancestors is excluded.
fn is_ignored(ignore: &GlobSet, rel: &Path) -> bool {
    !ignore.is_empty()
        && rel
            .ancestors()
            .filter(|a| !a.as_os_str().is_empty())
            .any(|a| ignore.is_match(to_slash(a)))
}

fn relative_to(path: &Path, cwd: &Path) -> PathBuf {
    path.strip_prefix(cwd)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace(MAIN_SEPARATOR, "/")
}
