//! Rendering of the generated harness module.
//!
//! Everything here is a pure function of its arguments; no filesystem or
//! clock access.

use std::fmt::Write as _;

use crate::harness::extract::DEFAULT_MARKER;
use crate::harness::registry::TestRegistry;
use crate::harness::support::SupportSection;

/// First line of every generated module.
pub const GENERATED_HEADER: &str = "// @generated by xtestgen. Do not edit.";

/// Prefix of the header line carrying the input digest.
pub const DIGEST_PREFIX: &str = "// xtestgen-digest: ";

/// Registry static name used when none is configured.
pub const DEFAULT_REGISTRY: &str = "TESTS";

/// Fixed text surrounding the extracted tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Text emitted after the header, typically imports.
    pub preamble: String,
    /// Name of the registry static.
    pub registry: String,
    /// Marker the tests were extracted with.
    pub marker: String,
    /// Drop the marker line from emitted bodies.
    pub strip_marker: bool,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            preamble: String::new(),
            registry: DEFAULT_REGISTRY.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            strip_marker: false,
        }
    }
}

/// Renders the harness module.
///
/// Layout: header and digest, preamble, one `mod` per support section, every
/// test body in registry order, then the registry static. Bodies precede the
/// registry that refers to them.
#[must_use]
pub fn assemble(
    template: &Template,
    support: &[SupportSection],
    registry: &TestRegistry,
    digest: &str,
) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    let _ = writeln!(out, "{DIGEST_PREFIX}{digest}");

    let preamble = template.preamble.trim_end();
    if !preamble.is_empty() {
        out.push('\n');
        out.push_str(preamble);
        out.push('\n');
    }

    for section in support {
        let _ = writeln!(out, "\nmod {} {{", section.name);
        out.push_str("use super::*;\n\n");
        out.push_str(&section.text);
        if !section.text.is_empty() && !section.text.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("}\n");
    }

    for test in registry.tests() {
        out.push('\n');
        let body = if template.strip_marker {
            strip_marker_line(&test.body, &template.marker)
        } else {
            test.body.as_str()
        };
        out.push_str(body);
        out.push('\n');
    }

    let _ = write!(out, "\npub static {}: &[(&str, fn())] = &[\n", template.registry);
    for test in registry.tests() {
        let _ = writeln!(out, "    (\"{0}\", {0}),", test.name);
    }
    out.push_str("];\n");
    out
}

fn strip_marker_line<'a>(body: &'a str, marker: &str) -> &'a str {
    match body.split_once('\n') {
        Some((first, rest)) if first.trim() == marker.trim() => rest,
        _ => body,
    }
}
