//! In-memory filesystem adapter with explicit timestamps.
//!
//! Every write advances an internal logical clock by one second, so a file
//! written later is always strictly newer than one written earlier. Tests can
//! override any timestamp with [`MemFileSystem::set_modified`].

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::ports::filesystem::{FileSystem, WriteLock};

#[derive(Debug, Clone)]
struct MemFile {
    contents: Vec<u8>,
    modified: DateTime<Utc>,
}

#[derive(Debug)]
struct State {
    files: BTreeMap<PathBuf, MemFile>,
    dirs: BTreeSet<PathBuf>,
    now: DateTime<Utc>,
    writes: usize,
}

/// Filesystem held entirely in memory.
#[derive(Debug)]
pub struct MemFileSystem {
    state: Mutex<State>,
}

impl Default for MemFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFileSystem {
    /// Creates an empty filesystem whose clock starts at the Unix epoch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                files: BTreeMap::new(),
                dirs: BTreeSet::new(),
                now: DateTime::<Utc>::UNIX_EPOCH,
                writes: 0,
            }),
        }
    }

    /// Adds or replaces a text file, stamping it with the next clock tick.
    ///
    /// Seeding does not count towards [`MemFileSystem::writes`].
    pub fn insert(&self, path: impl Into<PathBuf>, contents: &str) {
        self.insert_bytes(path, contents.as_bytes());
    }

    /// Adds or replaces a file with raw bytes.
    pub fn insert_bytes(&self, path: impl Into<PathBuf>, contents: &[u8]) {
        let mut state = self.state.lock().expect("memfs lock poisoned");
        let modified = tick(&mut state);
        state.files.insert(path.into(), MemFile { contents: contents.to_vec(), modified });
    }

    /// Registers an empty directory so that walking it succeeds.
    pub fn create_dir(&self, path: impl Into<PathBuf>) {
        let mut state = self.state.lock().expect("memfs lock poisoned");
        state.dirs.insert(path.into());
    }

    /// Overrides the modification time of an existing file.
    ///
    /// # Panics
    ///
    /// Panics if the file does not exist.
    pub fn set_modified(&self, path: &Path, modified: DateTime<Utc>) {
        let mut state = self.state.lock().expect("memfs lock poisoned");
        let file = state
            .files
            .get_mut(path)
            .unwrap_or_else(|| panic!("no such file: {}", path.display()));
        file.modified = modified;
    }

    /// Number of successful [`FileSystem::write_atomic`] calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.lock().expect("memfs lock poisoned").writes
    }

    /// Returns the current contents of a file, if present and UTF-8.
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<String> {
        let state = self.state.lock().expect("memfs lock poisoned");
        state.files.get(path).and_then(|f| String::from_utf8(f.contents.clone()).ok())
    }
}

fn tick(state: &mut State) -> DateTime<Utc> {
    state.now += Duration::seconds(1);
    state.now
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {}", path.display()))
}

impl FileSystem for MemFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.state.lock().expect("memfs lock poisoned");
        let file = state.files.get(path).ok_or_else(|| not_found(path))?;
        String::from_utf8(file.contents.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut state = self.state.lock().expect("memfs lock poisoned");
        let modified = tick(&mut state);
        state
            .files
            .insert(path.to_path_buf(), MemFile { contents: contents.as_bytes().to_vec(), modified });
        state.writes += 1;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().expect("memfs lock poisoned");
        state.files.contains_key(path)
            || state.dirs.iter().any(|d| d.starts_with(path))
            || state.files.keys().any(|k| k.starts_with(path))
    }

    fn walk_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state.lock().expect("memfs lock poisoned");
        let files: Vec<PathBuf> =
            state.files.keys().filter(|k| k.starts_with(root) && k.as_path() != root).cloned().collect();
        if files.is_empty() && !state.dirs.iter().any(|d| d.starts_with(root)) {
            return Err(not_found(root));
        }
        // `Path` ordering is component-wise, which matches a depth-first walk
        // with siblings sorted by name.
        Ok(files)
    }

    fn modified(&self, path: &Path) -> io::Result<DateTime<Utc>> {
        let state = self.state.lock().expect("memfs lock poisoned");
        state.files.get(path).map(|f| f.modified).ok_or_else(|| not_found(path))
    }

    fn lock(&self, _path: &Path) -> io::Result<WriteLock> {
        Ok(WriteLock::noop())
    }
}
