//! Filesystem primitives used by the merge engine.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// The kind of a filesystem entry.
///
/// Symlinks are not followed; anything that is not a directory is a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Blocking filesystem primitives.
///
/// The engine runs every call on the blocking thread pool, so implementations
/// may do plain synchronous I/O.
pub trait FileSystem: Send + Sync + 'static {
    /// Whether anything exists at `path`, without following symlinks.
    fn exists(&self, path: &Path) -> bool;

    /// Entry kind of `path`, without following symlinks.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Names of the entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Create a directory and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a file, replacing `dest`. Returns the bytes copied.
    fn copy_file(&self, source: &Path, dest: &Path) -> io::Result<u64>;

    /// Copy a directory's whole subtree to `dest`. Returns the bytes copied.
    fn copy_tree(&self, source: &Path, dest: &Path) -> io::Result<u64>;

    /// Remove `path` recursively. A missing path is not an error.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
}

/// Local disk implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new LocalFs instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = fs::symlink_metadata(path)?;
        Ok(if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, source: &Path, dest: &Path) -> io::Result<u64> {
        fs::copy(source, dest)
    }

    fn copy_tree(&self, source: &Path, dest: &Path) -> io::Result<u64> {
        fs::create_dir_all(dest)?;
        let mut options = fs_extra::dir::CopyOptions::new();
        options.overwrite = true;
        options.content_only = true;
        fs_extra::dir::copy(source, dest, &options).map_err(io::Error::other)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let result = match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stat_and_read_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("file.txt"), "x").unwrap();

        let local = LocalFs::new();
        assert_eq!(local.stat(&dir.path().join("sub")).unwrap(), EntryKind::Directory);
        assert_eq!(local.stat(&dir.path().join("file.txt")).unwrap(), EntryKind::File);

        let mut names = local.read_dir(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("file.txt"), OsString::from("sub")]);
    }

    #[test]
    fn test_copy_tree_into_missing_dest() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("nested/a.txt"), "hello").unwrap();

        let dest = dir.path().join("out/src");
        let bytes = LocalFs::new().copy_tree(&src, &dest).unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(fs::read_to_string(dest.join("nested/a.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_remove_all() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("gone");
        fs::create_dir_all(target.join("deep")).unwrap();
        fs::write(target.join("deep/x"), "x").unwrap();

        let local = LocalFs::new();
        local.remove_all(&target).unwrap();
        assert!(!local.exists(&target));

        // Missing paths are fine.
        local.remove_all(&target).unwrap();
    }
}
