//! Source enumeration.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::context::ServiceContext;
use crate::error::GenError;

/// Restrictions applied on top of the recursive walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    /// Allowed extensions without the dot. Empty means every file.
    pub extensions: Vec<String>,
    /// Files, or directories, never returned.
    pub exclude: Vec<PathBuf>,
}

impl SourceFilter {
    fn accepts(&self, path: &Path, excluded: &[PathBuf]) -> bool {
        if !excluded.is_empty() {
            let path = normalize(path);
            if excluded.iter().any(|e| path.starts_with(e)) {
                return false;
            }
        }
        self.extensions.is_empty()
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// Lists every candidate file under `root` in walk order.
///
/// # Errors
///
/// Returns [`GenError::InputTreeUnreadable`] if `root` is missing or any
/// directory beneath it cannot be read.
pub fn enumerate_sources(
    ctx: &ServiceContext,
    root: &Path,
    filter: &SourceFilter,
) -> Result<Vec<PathBuf>, GenError> {
    let files = ctx
        .fs
        .walk_files(root)
        .map_err(|source| GenError::InputTreeUnreadable { path: root.to_path_buf(), source })?;
    let excluded: Vec<PathBuf> = filter.exclude.iter().map(|e| normalize(e)).collect();
    let total = files.len();
    let sources: Vec<PathBuf> =
        files.into_iter().filter(|p| filter.accepts(p, &excluded)).collect();
    debug!(root = %root.display(), total, candidates = sources.len(), "enumerated sources");
    Ok(sources)
}

/// Absolute, lexically cleaned form of `path`, so `./src/gen.rs`,
/// `src/gen.rs` and `/cwd/src/x/../gen.rs` compare equal. Symlinks are not
/// resolved.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
