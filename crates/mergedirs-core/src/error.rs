//! Error types for merge operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::result::MergeResult;

/// The filesystem primitive that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Stat,
    ReadDir,
    CreateDir,
    CopyFile,
    CopyTree,
    Remove,
}

impl std::fmt::Display for IoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stat => write!(f, "stat"),
            Self::ReadDir => write!(f, "read directory"),
            Self::CreateDir => write!(f, "create directory"),
            Self::CopyFile => write!(f, "copy file"),
            Self::CopyTree => write!(f, "copy directory tree"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Errors that can occur while resolving targets or merging.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A source or ignore pattern could not be compiled.
    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The root directory could not be read.
    #[error("Cannot read root directory {path}: {source}")]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A conflict resolver returned a path outside the allowed set.
    #[error(
        "Conflict resolver returned {returned} for {dest}; expected {source_path}, {dest}, or a sibling of {dest}"
    )]
    ConflictResolver {
        source_path: PathBuf,
        dest: PathBuf,
        returned: PathBuf,
    },

    /// A filesystem primitive failed.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        operation: IoOperation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An unignored failure stopped the merge.
    #[error("Merge aborted: {cause}")]
    Aborted {
        cause: Box<MergeError>,
        partial: Box<MergeResult>,
    },

    /// The caller cancelled the merge.
    #[error("Merge cancelled")]
    Cancelled { partial: Box<MergeResult> },
}

impl MergeError {
    /// Create an I/O error with operation and path context.
    pub fn io(operation: IoOperation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error happened while expanding targets, before any job ran.
    pub fn is_target_resolution(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. } | Self::UnreadableRoot { .. })
    }

    /// The report accumulated before the merge stopped, if any.
    pub fn partial(&self) -> Option<&MergeResult> {
        match self {
            Self::Aborted { partial, .. } | Self::Cancelled { partial } => Some(partial),
            _ => None,
        }
    }
}
