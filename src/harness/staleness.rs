//! Deciding whether the generated module must be rebuilt.
//!
//! The default policy compares modification times and can miss a needed
//! rebuild under clock skew or timestamp-preserving copies. The content
//! digest mode and the `always` mode exist for callers that need more.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::context::ServiceContext;
use crate::error::GenError;
use crate::harness::assemble::{Template, DIGEST_PREFIX};
use crate::harness::support::SupportSection;
use crate::harness::SourceFile;

/// How staleness is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StalenessMode {
    /// Regenerate when any input is newer than the output.
    #[default]
    Mtime,
    /// Regenerate when the input digest differs from the one in the output.
    Hash,
    /// Always regenerate.
    Always,
}

/// Outcome of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StalenessDecision {
    /// There is no previous output.
    OutputMissing,
    /// `input` was modified after the output.
    InputNewer {
        /// The most recently modified input.
        input: PathBuf,
    },
    /// The recorded digest is absent or differs.
    DigestChanged,
    /// Regeneration was requested unconditionally.
    Forced,
    /// The output reflects the current inputs.
    UpToDate,
}

impl StalenessDecision {
    /// Returns `true` when the output must be regenerated.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

impl fmt::Display for StalenessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputMissing => f.write_str("output does not exist"),
            Self::InputNewer { input } => write!(f, "{} is newer than the output", input.display()),
            Self::DigestChanged => f.write_str("input digest changed"),
            Self::Forced => f.write_str("regeneration forced"),
            Self::UpToDate => f.write_str("up to date"),
        }
    }
}

/// Compares the output's modification time with every input's.
///
/// An input counts as newer only if its timestamp is strictly greater.
///
/// # Errors
///
/// Returns [`GenError::InputTreeUnreadable`] if an input's timestamp cannot
/// be read.
pub fn check_mtime(
    ctx: &ServiceContext,
    output: &Path,
    inputs: &[PathBuf],
) -> Result<StalenessDecision, GenError> {
    if !ctx.fs.exists(output) {
        return Ok(StalenessDecision::OutputMissing);
    }
    let output_time = match ctx.fs.modified(output) {
        Ok(t) => t,
        Err(e) => {
            warn!(output = %output.display(), error = %e, "cannot read output timestamp; regenerating");
            return Ok(StalenessDecision::OutputMissing);
        }
    };

    let mut newest: Option<(chrono::DateTime<chrono::Utc>, &PathBuf)> = None;
    for input in inputs {
        let modified = ctx
            .fs
            .modified(input)
            .map_err(|source| GenError::InputTreeUnreadable { path: input.clone(), source })?;
        if newest.map_or(true, |(t, _)| modified > t) {
            newest = Some((modified, input));
        }
    }

    match newest {
        Some((t, input)) if t > output_time => {
            debug!(input = %input.display(), %t, %output_time, "input newer than output");
            Ok(StalenessDecision::InputNewer { input: input.clone() })
        }
        _ => Ok(StalenessDecision::UpToDate),
    }
}

/// Compares `digest` with the one recorded in the existing output.
#[must_use]
pub fn check_digest(ctx: &ServiceContext, output: &Path, digest: &str) -> StalenessDecision {
    let Ok(existing) = ctx.fs.read_to_string(output) else {
        return StalenessDecision::OutputMissing;
    };
    if recorded_digest(&existing) == Some(digest) {
        StalenessDecision::UpToDate
    } else {
        StalenessDecision::DigestChanged
    }
}

/// Extracts the digest from a generated module's header, if present.
#[must_use]
pub fn recorded_digest(output: &str) -> Option<&str> {
    output.lines().take(4).find_map(|line| line.strip_prefix(DIGEST_PREFIX)).map(str::trim)
}

/// Digest over everything that influences the generated text.
#[must_use]
pub fn input_digest(template: &Template, support: &[SupportSection], sources: &[SourceFile]) -> String {
    let mut hasher = Sha256::new();
    let mut field = |bytes: &[u8]| {
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };

    field(template.preamble.as_bytes());
    field(template.registry.as_bytes());
    field(template.marker.as_bytes());
    field(&[u8::from(template.strip_marker)]);
    for section in support {
        field(section.name.as_bytes());
        field(section.text.as_bytes());
    }
    for source in sources {
        field(source.path.to_string_lossy().as_bytes());
        field(source.text.as_bytes());
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
