//! Conflict resolution and directory overwrite policies.
//!
//! Policies are plain values: a named built-in or a user function. The
//! built-in conflict policies are two constant resolvers, `overwrite`
//! (always answer the destination) and `skip` (always answer the source).

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Future returned by a conflict resolver.
pub type ResolverFuture = BoxFuture<'static, PathBuf>;

type ResolverFn = dyn Fn(&Path, &Path) -> ResolverFuture + Send + Sync;
type PredicateFn = dyn Fn(&Path, &Path) -> bool + Send + Sync;

/// How a target resolves a file or directory that already exists at its destination.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    /// Replace the existing destination.
    #[default]
    Overwrite,
    /// Keep the existing destination and leave the source unmerged.
    Skip,
    /// Ask a user-supplied resolver.
    #[serde(skip)]
    Custom(ConflictResolver),
}

impl ConflictResolution {
    /// Map this policy onto the resolver that implements it.
    pub fn into_resolver(self) -> ConflictResolver {
        match self {
            Self::Overwrite => ConflictResolver::overwrite(),
            Self::Skip => ConflictResolver::skip(),
            Self::Custom(resolver) => resolver,
        }
    }
}

impl fmt::Debug for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "Overwrite"),
            Self::Skip => write!(f, "Skip"),
            Self::Custom(resolver) => write!(f, "Custom({resolver:?})"),
        }
    }
}

impl From<ConflictResolver> for ConflictResolution {
    fn from(resolver: ConflictResolver) -> Self {
        Self::Custom(resolver)
    }
}

/// What to do with an entry after consulting the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the destination untouched.
    Skip,
    /// Write the source to this path.
    Write(PathBuf),
}

/// A normalized conflict resolver.
///
/// A resolver answers with the source path (skip), the destination path
/// (overwrite), or another path in the destination's directory (write there
/// instead). Anything else is rejected by [`ConflictResolver::resolve`].
#[derive(Clone)]
pub struct ConflictResolver {
    name: &'static str,
    resolve_fn: Arc<ResolverFn>,
}

impl ConflictResolver {
    /// Resolver that always overwrites the destination.
    pub fn overwrite() -> Self {
        Self {
            name: "overwrite",
            resolve_fn: Arc::new(|_: &Path, dest: &Path| {
                future::ready(dest.to_path_buf()).boxed()
            }),
        }
    }

    /// Resolver that always keeps the destination.
    pub fn skip() -> Self {
        Self {
            name: "skip",
            resolve_fn: Arc::new(|source: &Path, _: &Path| {
                future::ready(source.to_path_buf()).boxed()
            }),
        }
    }

    /// Wrap a synchronous resolver function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path) -> PathBuf + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            resolve_fn: Arc::new(move |source: &Path, dest: &Path| {
                future::ready(f(source, dest)).boxed()
            }),
        }
    }

    /// Wrap an asynchronous resolver function.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(PathBuf, PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PathBuf> + Send + 'static,
    {
        Self {
            name: "custom",
            resolve_fn: Arc::new(move |source: &Path, dest: &Path| {
                f(source.to_path_buf(), dest.to_path_buf()).boxed()
            }),
        }
    }

    /// Name of the policy, `"custom"` for user functions.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the resolver where `source` should go, given that `dest` exists.
    pub async fn resolve(&self, source: &Path, dest: &Path) -> Result<Resolution, MergeError> {
        let returned = (self.resolve_fn)(source, dest).await;

        if returned == source {
            return Ok(Resolution::Skip);
        }
        if returned == dest || is_sibling(&returned, dest) {
            return Ok(Resolution::Write(returned));
        }

        Err(MergeError::ConflictResolver {
            source_path: source.to_path_buf(),
            dest: dest.to_path_buf(),
            returned,
        })
    }
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::overwrite()
    }
}

impl fmt::Debug for ConflictResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConflictResolver").field(&self.name).finish()
    }
}

fn is_sibling(candidate: &Path, dest: &Path) -> bool {
    candidate.file_name().is_some() && candidate.parent() == dest.parent()
}

/// Whether an existing destination directory is replaced wholesale.
#[derive(Clone, Default)]
pub enum OverwriteDirectory {
    /// Merge into the existing directory.
    #[default]
    Never,
    /// Remove the destination and copy the whole source tree.
    Always,
    /// Decide per directory.
    When(Arc<PredicateFn>),
}

impl OverwriteDirectory {
    /// Decide per directory with a predicate over `(source, dest)`.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        Self::When(Arc::new(f))
    }

    /// Whether the directory at `source` replaces `dest`.
    pub fn applies(&self, source: &Path, dest: &Path) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::When(predicate) => predicate(source, dest),
        }
    }
}

impl From<bool> for OverwriteDirectory {
    fn from(overwrite: bool) -> Self {
        if overwrite { Self::Always } else { Self::Never }
    }
}

impl fmt::Debug for OverwriteDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "Never"),
            Self::Always => write!(f, "Always"),
            Self::When(_) => write!(f, "When(..)"),
        }
    }
}
