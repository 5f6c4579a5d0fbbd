//! Generation pipeline: enumerate, check staleness, extract, assemble, write.

use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::context::ServiceContext;
use crate::error::{GenError, SourceLocation};
use crate::harness::assemble::assemble;
use crate::harness::enumerate::enumerate_sources;
use crate::harness::extract::extract_tests;
use crate::harness::registry::TestRegistry;
use crate::harness::staleness::{
    check_digest, check_mtime, input_digest, StalenessDecision, StalenessMode,
};
use crate::harness::support::{load_support, SupportSection};
use crate::harness::{ExtractedTest, SourceFile};

/// Result of a [`generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The output was current; nothing was written.
    UpToDate,
    /// The output was (re)written.
    Generated {
        /// Number of tests in the registry.
        tests: usize,
        /// Why regeneration happened.
        reason: StalenessDecision,
    },
}

/// Regenerates the harness module if it is stale.
///
/// Holds the output's advisory lock from the staleness check through the
/// write, so concurrent runs against the same output serialize. Nothing is
/// written unless every step succeeds.
///
/// # Errors
///
/// Returns the first [`GenError`] raised by enumeration, reading,
/// extraction, name collision, or writing.
pub fn generate(ctx: &ServiceContext, config: &HarnessConfig) -> Result<Outcome, GenError> {
    let sources = enumerate_sources(ctx, &config.root, &config.source_filter())?;
    let _lock = ctx.fs.lock(&config.output).map_err(|source| output_failure(config, source))?;

    let mut reason = match config.staleness {
        StalenessMode::Mtime => {
            let decision = check_mtime(ctx, &config.output, &inputs(config, &sources))?;
            if !decision.is_stale() {
                info!(output = %config.output.display(), "harness up to date");
                return Ok(Outcome::UpToDate);
            }
            decision
        }
        StalenessMode::Always => StalenessDecision::Forced,
        // Decided once the inputs have been read.
        StalenessMode::Hash => StalenessDecision::DigestChanged,
    };

    let files = read_sources(ctx, &sources)?;
    let support = load_all_support(ctx, config)?;
    let template = config.template();
    let digest = input_digest(&template, &support, &files);

    if config.staleness == StalenessMode::Hash {
        reason = check_digest(ctx, &config.output, &digest);
        if !reason.is_stale() {
            info!(output = %config.output.display(), %digest, "harness up to date");
            return Ok(Outcome::UpToDate);
        }
    }

    let registry = build_registry(&files, &config.marker)?;
    let text = assemble(&template, &support, &registry, &digest);
    ctx.fs.write_atomic(&config.output, &text).map_err(|source| output_failure(config, source))?;

    info!(
        output = %config.output.display(),
        tests = registry.len(),
        files = files.len(),
        %reason,
        "harness generated"
    );
    Ok(Outcome::Generated { tests: registry.len(), reason })
}

/// Scans the tree and returns every test without writing anything.
///
/// # Errors
///
/// Same as [`generate`], minus write failures.
pub fn collect(ctx: &ServiceContext, config: &HarnessConfig) -> Result<TestRegistry, GenError> {
    let sources = enumerate_sources(ctx, &config.root, &config.source_filter())?;
    let files = read_sources(ctx, &sources)?;
    build_registry(&files, &config.marker)
}

/// Reports whether [`generate`] would rewrite the output.
///
/// # Errors
///
/// Returns an error if inputs cannot be enumerated or read.
pub fn check(ctx: &ServiceContext, config: &HarnessConfig) -> Result<StalenessDecision, GenError> {
    let sources = enumerate_sources(ctx, &config.root, &config.source_filter())?;
    match config.staleness {
        StalenessMode::Mtime => check_mtime(ctx, &config.output, &inputs(config, &sources)),
        StalenessMode::Always => Ok(StalenessDecision::Forced),
        StalenessMode::Hash => {
            let files = read_sources(ctx, &sources)?;
            let support = load_all_support(ctx, config)?;
            let digest = input_digest(&config.template(), &support, &files);
            Ok(check_digest(ctx, &config.output, &digest))
        }
    }
}

/// Extracts every test from `files`, in order, rejecting duplicate names.
///
/// # Errors
///
/// Returns [`GenError::ExtractionAmbiguity`] or [`GenError::DuplicateTestName`].
pub fn build_registry(files: &[SourceFile], marker: &str) -> Result<TestRegistry, GenError> {
    let mut registry = TestRegistry::new();
    for file in files {
        for found in extract_tests(&file.text, marker) {
            let raw = found.map_err(|ambiguity| GenError::ExtractionAmbiguity {
                location: SourceLocation { path: file.path.clone(), line: ambiguity.line },
                reason: ambiguity.reason,
            })?;
            registry.push(ExtractedTest {
                name: raw.name.to_string(),
                body: raw.body.to_string(),
                location: SourceLocation { path: file.path.clone(), line: raw.line },
            })?;
        }
    }
    Ok(registry)
}

fn inputs(config: &HarnessConfig, sources: &[PathBuf]) -> Vec<PathBuf> {
    sources.iter().cloned().chain(config.extra_inputs()).collect()
}

fn read_sources(ctx: &ServiceContext, paths: &[PathBuf]) -> Result<Vec<SourceFile>, GenError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match ctx.fs.read_to_string(path) {
            Ok(text) => files.push(SourceFile { path: path.clone(), text }),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                debug!(path = %path.display(), "skipping non-UTF-8 file");
            }
            Err(source) => {
                return Err(GenError::InputTreeUnreadable { path: path.clone(), source });
            }
        }
    }
    Ok(files)
}

fn load_all_support(
    ctx: &ServiceContext,
    config: &HarnessConfig,
) -> Result<Vec<SupportSection>, GenError> {
    config.support.iter().map(|m| load_support(ctx, m, &config.strip_prefixes)).collect()
}

fn output_failure(config: &HarnessConfig, source: io::Error) -> GenError {
    GenError::OutputWriteFailure { path: config.output.clone(), source }
}
