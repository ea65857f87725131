//! File-based merge configuration.
//!
//! ```toml
//! root = "packages"
//! ignore_errors = true
//!
//! [[targets]]
//! src = ["*/dist/**"]
//! dest = "build"
//! ignore = ["**/*.map"]
//! flatten = false
//! conflict_resolution = "skip"
//! ```
//!
//! When loaded with [`MergeConfig::from_path`], relative `root` and `dest`
//! paths are taken relative to the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::options::{MergeDirsOptions, MergeTarget};
use crate::policy::ConflictResolution;

/// A single pattern or a list of patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern],
            Self::Many(patterns) => patterns,
        }
    }
}

/// Serialized form of a [`MergeTarget`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub dest: PathBuf,
    pub src: Patterns,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default = "default_true")]
    pub flatten: bool,
    #[serde(default)]
    pub overwrite_directory: bool,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
}

fn default_true() -> bool {
    true
}

impl From<TargetConfig> for MergeTarget {
    fn from(config: TargetConfig) -> Self {
        MergeTarget::with_patterns(config.src.into_vec(), config.dest)
            .with_ignore(config.ignore)
            .with_flatten(config.flatten)
            .with_overwrite_directory(config.overwrite_directory)
            .with_conflict_resolution(config.conflict_resolution)
    }
}

/// Serialized form of [`MergeDirsOptions`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub ignore_errors: bool,
    #[serde(default)]
    pub ignore_empty_folders: bool,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl MergeConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, MergeError> {
        toml::from_str(content).map_err(|e| MergeError::invalid_config(e.to_string()))
    }

    /// Load a TOML file.
    ///
    /// A relative `root` and relative target destinations are resolved
    /// against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self, MergeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MergeError::invalid_config(format!("Cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(dir) = path.parent() {
            if let Some(root) = config.root.as_mut().filter(|r| r.is_relative()) {
                *root = dir.join(&*root);
            }
            for target in &mut config.targets {
                if target.dest.is_relative() {
                    target.dest = dir.join(&target.dest);
                }
            }
        }

        Ok(config)
    }

    /// Build validated merge options.
    pub fn into_options(self) -> Result<MergeDirsOptions, MergeError> {
        let mut builder = MergeDirsOptions::builder();
        builder
            .targets(
                self.targets
                    .into_iter()
                    .map(MergeTarget::from)
                    .collect::<Vec<_>>(),
            )
            .ignore_errors(self.ignore_errors)
            .ignore_empty_folders(self.ignore_empty_folders);
        if let Some(root) = self.root {
            builder.root(root);
        }
        builder
            .build()
            .map_err(|e| MergeError::invalid_config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::OverwriteDirectory;

    #[test]
    fn test_parse_full_config() {
        let config = MergeConfig::from_toml_str(
            r#"
            root = "packages"
            ignore_errors = true

            [[targets]]
            src = ["*/dist/**", "*/types/**"]
            dest = "build"
            ignore = ["**/*.map"]
            flatten = false
            overwrite_directory = true
            conflict_resolution = "skip"

            [[targets]]
            src = "README.md"
            dest = "build"
            "#,
        )
        .unwrap();

        assert!(config.ignore_errors);
        assert!(!config.ignore_empty_folders);
        assert_eq!(config.targets.len(), 2);

        let options = config.into_options().unwrap();
        assert_eq!(options.root, Some(PathBuf::from("packages")));

        let first = &options.targets[0];
        assert_eq!(first.src, vec!["*/dist/**", "*/types/**"]);
        assert!(!first.flatten);
        assert!(matches!(first.overwrite_directory, OverwriteDirectory::Always));
        assert!(matches!(first.conflict_resolution, ConflictResolution::Skip));

        let second = &options.targets[1];
        assert_eq!(second.src, vec!["README.md"]);
        assert!(second.flatten);
        assert!(matches!(second.conflict_resolution, ConflictResolution::Overwrite));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let err = MergeConfig::from_toml_str(
            r#"
            [[targets]]
            src = "a"
            dest = "b"
            conflict_resolution = "rename"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::InvalidConfig { .. }));
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(MergeConfig::from_toml_str("verbose = true").is_err());
    }

    #[test]
    fn test_empty_config_has_no_targets() {
        let config = MergeConfig::from_toml_str("").unwrap();
        assert!(config.into_options().is_err());
    }

    #[test]
    fn test_from_path_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        std::fs::write(
            &path,
            "root = \"src\"\n[[targets]]\nsrc = \"*\"\ndest = \"out\"\n",
        )
        .unwrap();

        let config = MergeConfig::from_path(&path).unwrap();
        assert_eq!(config.root, Some(dir.path().join("src")));
        assert_eq!(config.targets[0].dest, dir.path().join("out"));
    }
}
