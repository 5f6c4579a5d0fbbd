//! Generator configuration loaded from `xtestgen.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::error::GenError;
use crate::harness::assemble::{Template, DEFAULT_REGISTRY};
use crate::harness::enumerate::SourceFilter;
use crate::harness::extract::DEFAULT_MARKER;
use crate::harness::staleness::StalenessMode;
use crate::harness::support::{SupportModule, DEFAULT_STRIP_PREFIXES};
use crate::ports::filesystem::lock_path;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "xtestgen.yaml";

/// Everything the generator needs to know about one harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory scanned recursively for tests.
    pub root: PathBuf,
    /// Generated module path.
    pub output: PathBuf,
    /// Line that introduces a test.
    pub marker: String,
    /// Extension allow-list; empty scans every file.
    pub extensions: Vec<String>,
    /// Paths under `root` that are never scanned.
    pub exclude: Vec<PathBuf>,
    /// Helper files inlined as modules.
    pub support: Vec<SupportModule>,
    /// Support-file lines starting with any of these are dropped.
    pub strip_prefixes: Vec<String>,
    /// Text emitted at the top of the module.
    pub preamble: String,
    /// Name of the registry static.
    pub registry: String,
    /// Drop the marker line from emitted bodies.
    pub strip_marker: bool,
    /// Staleness policy.
    pub staleness: StalenessMode,
    /// File this config was loaded from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src"),
            output: PathBuf::from("tests.rs"),
            marker: DEFAULT_MARKER.to_string(),
            extensions: Vec::new(),
            exclude: Vec::new(),
            support: Vec::new(),
            strip_prefixes: DEFAULT_STRIP_PREFIXES.iter().map(|s| (*s).to_string()).collect(),
            preamble: String::new(),
            registry: DEFAULT_REGISTRY.to_string(),
            strip_marker: false,
            staleness: StalenessMode::Mtime,
            source: None,
        }
    }
}

impl HarnessConfig {
    /// Parses a config from YAML text. Relative paths resolve against `base`.
    ///
    /// # Errors
    ///
    /// Returns a message if the YAML is malformed, has unknown fields, or
    /// names an invalid registry.
    pub fn from_yaml(yaml: &str, base: &Path) -> Result<Self, String> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| e.to_string())?
        };
        config.resolve_relative_to(base);
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file through the filesystem port.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Config`] if the file cannot be read or parsed.
    pub fn load(ctx: &ServiceContext, path: &Path) -> Result<Self, GenError> {
        let yaml = ctx.fs.read_to_string(path).map_err(|e| GenError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut config = Self::from_yaml(&yaml, base)
            .map_err(|message| GenError::Config { path: path.to_path_buf(), message })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Rejects settings that would produce an uncompilable module.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.marker.trim().is_empty() {
            return Err("marker must not be empty".to_string());
        }
        if !is_identifier(&self.registry) {
            return Err(format!("registry `{}` is not a valid identifier", self.registry));
        }
        if let Some(bad) = self.support.iter().find(|m| !is_identifier(&m.name)) {
            return Err(format!("support module name `{}` is not a valid identifier", bad.name));
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !base.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.root);
        resolve(&mut self.output);
        self.exclude.iter_mut().for_each(resolve);
        self.support.iter_mut().for_each(|m| resolve(&mut m.path));
    }

    /// Template settings for the assembler.
    #[must_use]
    pub fn template(&self) -> Template {
        Template {
            preamble: self.preamble.clone(),
            registry: self.registry.clone(),
            marker: self.marker.clone(),
            strip_marker: self.strip_marker,
        }
    }

    /// Enumeration filter. The output and its lock file are always excluded.
    #[must_use]
    pub fn source_filter(&self) -> SourceFilter {
        let mut exclude = self.exclude.clone();
        exclude.push(self.output.clone());
        exclude.push(lock_path(&self.output));
        SourceFilter { extensions: self.extensions.clone(), exclude }
    }

    /// Files besides the scanned sources whose changes make the output stale.
    #[must_use]
    pub fn extra_inputs(&self) -> Vec<PathBuf> {
        self.support.iter().map(|m| m.path.clone()).chain(self.source.clone()).collect()
    }
}

/// Strict and reserved keywords of the 2021 edition, plus `_`.
const KEYWORDS: &[&str] = &[
    "_", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&s)
}
