//! Marker-based test extraction.
//!
//! This is a pattern scanner, not a parser. A test is a marker line, an
//! optional run of further attribute lines, a `fn <name>() {` header at the
//! marker's indentation, and everything up to the first `}` line at that
//! same indentation. The scan never crosses the next marker line. Anything
//! that does not fit those rules is reported as an [`Ambiguity`] instead of
//! being guessed at.
//!
//! Markers are recognized line by line, before any lexing. A line inside a
//! multi-line string literal that reads exactly like the marker is therefore
//! taken as a marker, and usually surfaces as an [`Ambiguity`]. Sources that
//! embed test snippets in strings should escape them or use another marker.

/// Marker recognized when no other is configured.
pub const DEFAULT_MARKER: &str = "#[test]";

/// A test found in one file's text. Slices borrow from that text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTest<'a> {
    /// Function name from the header.
    pub name: &'a str,
    /// Declaration text from the marker line through the closing brace,
    /// byte-for-byte as it appears in the source.
    pub body: &'a str,
    /// 1-based line of the marker.
    pub line: usize,
}

/// Why a marked declaration could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// 1-based line of the marker.
    pub line: usize,
    /// Human-readable reason.
    pub reason: String,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    content_end: usize,
    content: &'a str,
}

/// Iterator over the tests in one file. Created by [`extract_tests`].
///
/// Yields `Err` at most once; iteration stops after the first ambiguity.
pub struct Tests<'a> {
    text: &'a str,
    marker: &'a str,
    lines: Vec<Line<'a>>,
    next: usize,
}

/// Scans `text` for declarations introduced by `marker`.
///
/// A file without the marker yields an empty sequence.
#[must_use]
pub fn extract_tests<'a>(text: &'a str, marker: &'a str) -> Tests<'a> {
    let mut lines = Vec::new();
    let mut start = 0;
    for raw in text.split_inclusive('\n') {
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        lines.push(Line { start, content_end: start + content.len(), content });
        start += raw.len();
    }
    Tests { text, marker: marker.trim(), lines, next: 0 }
}

impl<'a> Iterator for Tests<'a> {
    type Item = Result<RawTest<'a>, Ambiguity>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.lines.len() {
            let idx = self.next;
            self.next += 1;
            if !self.is_marker(idx) {
                continue;
            }
            return Some(match self.take_test(idx) {
                Ok((test, close)) => {
                    self.next = close + 1;
                    Ok(test)
                }
                Err(reason) => {
                    self.next = self.lines.len();
                    Err(Ambiguity { line: idx + 1, reason })
                }
            });
        }
        None
    }
}

impl<'a> Tests<'a> {
    fn is_marker(&self, idx: usize) -> bool {
        self.lines[idx].content.trim() == self.marker
    }

    /// Extracts the test whose marker sits on line `marker_idx`, returning it
    /// together with the index of its closing line.
    fn take_test(&self, marker_idx: usize) -> Result<(RawTest<'a>, usize), String> {
        let lines = &self.lines;
        let marker_line = lines[marker_idx].content;
        let indent = &marker_line[..marker_line.len() - marker_line.trim_start().len()];

        let mut header_idx = marker_idx + 1;
        while header_idx < lines.len()
            && !self.is_marker(header_idx)
            && is_attribute(lines[header_idx].content, indent)
        {
            header_idx += 1;
        }
        if header_idx == lines.len() {
            return Err(format!("`{}` is not followed by a function", self.marker));
        }

        let header = lines[header_idx].content;
        let (name, inline) = parse_header(header, indent).ok_or_else(|| {
            format!(
                "expected `fn <name>() {{` at the marker's indentation, found `{}`",
                header.trim()
            )
        })?;

        let close_idx = if inline {
            header_idx
        } else {
            let closing = format!("{indent}}}");
            let mut j = header_idx + 1;
            loop {
                if j == lines.len() {
                    return Err(format!(
                        "no closing `}}` at the indentation of `{name}` before end of input"
                    ));
                }
                if self.is_marker(j) {
                    return Err(format!(
                        "reached the next `{}` before the closing `}}` of `{name}`",
                        self.marker
                    ));
                }
                if lines[j].content.trim_end() == closing {
                    break j;
                }
                j += 1;
            }
        };

        let function = &self.text[lines[header_idx].start..lines[close_idx].content_end];
        check_braces(function).map_err(|problem| format!("braces in `{name}` {problem}"))?;

        let body = &self.text[lines[marker_idx].start..lines[close_idx].content_end];
        Ok((RawTest { name, body, line: marker_idx + 1 }, close_idx))
    }
}

fn is_attribute(content: &str, indent: &str) -> bool {
    content.strip_prefix(indent).is_some_and(|rest| rest.starts_with("#["))
}

/// Parses `fn <name>() {` at exactly `indent`. The flag is `true` when the
/// whole body sits on the header line, as in `fn empty() {}`.
fn parse_header<'a>(content: &'a str, indent: &str) -> Option<(&'a str, bool)> {
    let rest = content.strip_prefix(indent)?.strip_prefix("fn ")?.trim_start();
    let name_len = rest.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(rest.len());
    let (name, rest) = rest.split_at(name_len);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix("()")?.trim();
    if rest == "{" {
        Some((name, false))
    } else if rest.len() >= 2 && rest.starts_with('{') && rest.ends_with('}') {
        Some((name, true))
    } else {
        None
    }
}

/// Checks that braces in `function` open on its header and close exactly at
/// its final character, skipping comments, strings, and char literals.
fn check_braces(function: &str) -> Result<(), &'static str> {
    let bytes = function.as_bytes();
    let last = function.trim_end().len().saturating_sub(1);
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let mut nesting = 1;
                i += 2;
                while i < bytes.len() && nesting > 0 {
                    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        nesting += 1;
                        i += 1;
                    } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        nesting -= 1;
                        i += 1;
                    }
                    i += 1;
                }
                continue;
            }
            b'r' if starts_raw_string(bytes, i) => {
                i = skip_raw_string(bytes, i);
                continue;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'\'' => i = skip_char_literal(function, i),
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return Err("close before they open");
                }
                depth -= 1;
                if depth == 0 && i != last {
                    return Err("close before the final line");
                }
            }
            _ => {}
        }
        i += 1;
    }

    if depth == 0 {
        Ok(())
    } else {
        Err("are left open at the closing line")
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `r"`, `r#"`, `br"` and friends, not an identifier ending in `r`.
fn starts_raw_string(bytes: &[u8], i: usize) -> bool {
    let prefix_ok = match i.checked_sub(1).map(|p| bytes[p]) {
        None => true,
        Some(b'b') => i < 2 || !is_ident_byte(bytes[i - 2]),
        Some(prev) => !is_ident_byte(prev),
    };
    if !prefix_ok {
        return false;
    }
    let mut j = i + 1;
    while bytes.get(j) == Some(&b'#') {
        j += 1;
    }
    bytes.get(j) == Some(&b'"')
}

/// Returns the index just past the raw string starting at `i`.
fn skip_raw_string(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 1;
    let mut hashes = 0;
    while bytes.get(j) == Some(&b'#') {
        hashes += 1;
        j += 1;
    }
    j += 1;
    while j < bytes.len() {
        if bytes[j] == b'"' && bytes[j + 1..].iter().take(hashes).filter(|&&b| b == b'#').count() == hashes
        {
            return j + 1 + hashes;
        }
        j += 1;
    }
    bytes.len()
}

/// Returns the index of the last byte of the char literal at `i`, or `i`
/// itself when the quote starts a lifetime.
fn skip_char_literal(text: &str, i: usize) -> usize {
    let bytes = text.as_bytes();
    if bytes.get(i + 1) == Some(&b'\\') {
        // Skip the escaped byte itself so `'\''` ends on its last quote.
        let mut j = i + 3;
        while j < bytes.len() && bytes[j] != b'\'' {
            j += 1;
        }
        return j;
    }
    let Some(ch) = text.get(i + 1..).and_then(|rest| rest.chars().next()) else {
        return i;
    };
    let end = i + 1 + ch.len_utf8();
    if bytes.get(end) == Some(&b'\'') {
        end
    } else {
        i
    }
}
