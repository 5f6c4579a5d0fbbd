//! Error taxonomy for harness generation.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A position in a scanned source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Path of the file the test was found in.
    pub path: PathBuf,
    /// 1-based line of the marker that opens the test.
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Errors that abort a generation run.
///
/// None of these are retried; each is surfaced to the caller as soon as it
/// occurs and no output is written.
#[derive(Debug, Error)]
pub enum GenError {
    /// The input root, or a file under it, could not be read.
    #[error("input tree unreadable at {path}: {source}")]
    InputTreeUnreadable {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A marked declaration whose extent could not be determined.
    #[error("ambiguous test declaration at {location}: {reason}")]
    ExtractionAmbiguity {
        /// Where the offending marker sits.
        location: SourceLocation,
        /// What the extractor could not resolve.
        reason: String,
    },

    /// Two extracted tests share a name.
    #[error("duplicate test name `{name}`: first defined at {first}, again at {second}")]
    DuplicateTestName {
        /// The colliding name.
        name: String,
        /// Location of the first definition.
        first: SourceLocation,
        /// Location of the second definition.
        second: SourceLocation,
    },

    /// A designated support module could not be read.
    #[error("support module `{name}` unreadable at {path}: {source}")]
    SupportModuleUnreadable {
        /// Module name as it appears in the generated output.
        name: String,
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing, renaming, or locking the output failed.
    #[error("failed to write output {path}: {source}")]
    OutputWriteFailure {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file could not be loaded.
    #[error("invalid configuration {path}: {message}")]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Reason the file was rejected.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_both_locations() {
        let err = GenError::DuplicateTestName {
            name: "dup".into(),
            first: SourceLocation { path: PathBuf::from("src/a.rs"), line: 3 },
            second: SourceLocation { path: PathBuf::from("src/b.rs"), line: 10 },
        };
        let msg = err.to_string();
        assert!(msg.contains("`dup`"));
        assert!(msg.contains("src/a.rs:3"));
        assert!(msg.contains("src/b.rs:10"));
    }

    #[test]
    fn io_source_is_chained() {
        use std::error::Error as _;

        let err = GenError::OutputWriteFailure {
            path: PathBuf::from("out.rs"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
