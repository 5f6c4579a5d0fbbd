//! Support modules inlined verbatim into the generated output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::error::GenError;

/// Import prefixes stripped from support text when nothing else is configured.
pub const DEFAULT_STRIP_PREFIXES: &[&str] = &["use crate::", "use super::"];

/// A designated helper file and the module name it is emitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportModule {
    /// Module name in the generated output (`mod <name> { ... }`).
    pub name: String,
    /// File whose text is inlined.
    pub path: PathBuf,
}

/// A support module's text, ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportSection {
    /// Module name.
    pub name: String,
    /// Text with self-referential imports removed.
    pub text: String,
}

/// Reads a support module and strips its self-referential import lines.
///
/// # Errors
///
/// Returns [`GenError::SupportModuleUnreadable`] if the file cannot be read.
pub fn load_support(
    ctx: &ServiceContext,
    module: &SupportModule,
    strip_prefixes: &[String],
) -> Result<SupportSection, GenError> {
    let raw = ctx.fs.read_to_string(&module.path).map_err(|source| {
        GenError::SupportModuleUnreadable {
            name: module.name.clone(),
            path: module.path.clone(),
            source,
        }
    })?;
    Ok(SupportSection { name: module.name.clone(), text: strip_self_imports(&raw, strip_prefixes) })
}

/// Drops every line that starts with one of `prefixes`. Other lines are kept
/// byte-for-byte.
#[must_use]
pub fn strip_self_imports(text: &str, prefixes: &[String]) -> String {
    text.split_inclusive('\n')
        .filter(|line| !prefixes.iter().any(|p| line.starts_with(p.as_str())))
        .collect()
}
