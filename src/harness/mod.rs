//! Harness generation: scan a source tree for marked tests and emit a single
//! module holding every test plus a registry of entry points.

pub mod assemble;
pub mod driver;
pub mod enumerate;
pub mod extract;
pub mod registry;
pub mod staleness;
pub mod support;

use std::path::PathBuf;

use serde::Serialize;

use crate::error::SourceLocation;

/// A scanned input file. Re-read on every generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as enumerated.
    pub path: PathBuf,
    /// Full text.
    pub text: String,
}

/// One test lifted out of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedTest {
    /// Function name; unique across the whole run.
    pub name: String,
    /// Verbatim declaration text, marker included.
    #[serde(skip)]
    pub body: String,
    /// Where the marker was found.
    pub location: SourceLocation,
}
