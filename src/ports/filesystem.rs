//! Filesystem port for the generator's file I/O.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Provides filesystem access for scanning inputs and replacing the output.
///
/// Abstracting the filesystem lets the generator run against an in-memory
/// tree with explicit timestamps in tests.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or is not
    /// valid UTF-8 (`io::ErrorKind::InvalidData`).
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replaces the file at `path` with `contents` without ever exposing a
    /// partially written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed
    /// into place. The previous file is left untouched in that case.
    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists every regular file under `root`, recursively, in a stable
    /// depth-first order with siblings sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is missing or any directory under it
    /// cannot be read.
    fn walk_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns the last-modified time of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or has no timestamp.
    fn modified(&self, path: &Path) -> io::Result<DateTime<Utc>>;

    /// Takes an exclusive advisory lock guarding writes to `path`.
    ///
    /// Blocks until the lock is available. The lock is released when the
    /// returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or locked.
    fn lock(&self, path: &Path) -> io::Result<WriteLock>;
}

impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        (**self).write_atomic(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn walk_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).walk_files(root)
    }

    fn modified(&self, path: &Path) -> io::Result<DateTime<Utc>> {
        (**self).modified(path)
    }

    fn lock(&self, path: &Path) -> io::Result<WriteLock> {
        (**self).lock(path)
    }
}

/// Guard for an exclusive lock taken through [`FileSystem::lock`].
#[derive(Debug)]
pub struct WriteLock {
    file: Option<File>,
}

impl WriteLock {
    /// Wraps an open, already-locked file.
    #[must_use]
    pub fn held(file: File) -> Self {
        Self { file: Some(file) }
    }

    /// A guard that holds nothing, for adapters with no cross-process state.
    #[must_use]
    pub fn noop() -> Self {
        Self { file: None }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = fs2::FileExt::unlock(&file);
        }
    }
}

/// Path of the lock file that guards `output`.
#[must_use]
pub fn lock_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".lock");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_sits_next_to_output() {
        assert_eq!(lock_path(Path::new("xtests/tests.rs")), PathBuf::from("xtests/tests.rs.lock"));
    }
}
