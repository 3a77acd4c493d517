//! Math span protection
//!
//! Every math span is swapped for an opaque placeholder before any markup
//! rule runs, and swapped back verbatim at the very end. Placeholders are
//! built from Unicode private-use characters that no substitution rule can
//! produce, and any such characters already present in the input are removed
//! up front.

use crate::data::maps::{to_script, ScriptKind};

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// One protected span, recorded exactly as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    pub text: String,
    pub display: bool,
}

/// Side table of protected spans, indexed by placeholder number.
#[derive(Debug, Clone, Default)]
pub struct MathTable {
    spans: Vec<MathSpan>,
}

impl MathTable {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MathSpan> {
        self.spans.get(index)
    }

    fn push(&mut self, text: &str, display: bool, out: &mut String) {
        out.push(OPEN);
        out.push('M');
        out.push_str(&self.spans.len().to_string());
        out.push(CLOSE);
        self.spans.push(MathSpan {
            text: text.to_string(),
            display,
        });
    }

    /// Substitute every placeholder in `input` with its recorded span.
    pub fn restore(&self, input: &str) -> String {
        if self.spans.is_empty() {
            return input.to_string();
        }
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after = &rest[start..];
            match parse_placeholder(after) {
                Some((index, len)) if index < self.spans.len() => {
                    out.push_str(&self.spans[index].text);
                    rest = &after[len..];
                }
                _ => {
                    out.push(OPEN);
                    rest = &after[OPEN.len_utf8()..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Parse a placeholder at the start of `input`: returns (index, byte length).
pub fn parse_placeholder(input: &str) -> Option<(usize, usize)> {
    let body = input.strip_prefix(OPEN)?.strip_prefix('M')?;
    let digits = body.find(CLOSE)?;
    let index = body[..digits].parse().ok()?;
    Some((index, OPEN.len_utf8() + 1 + digits + CLOSE.len_utf8()))
}

/// Replace all math spans with placeholders.
///
/// Recognized spans: `$$..$$` and `\[..\]` (display) and `$..$` (inline).
/// Inline spans that are pure sub/superscript shorthands (`$_2$`, `$^{-1}$`,
/// `$G_2$`) are rewritten to Unicode script characters instead of being
/// protected. Unterminated delimiters are left as literal text.
pub fn protect_math(input: &str) -> (String, MathTable) {
    let input: String = input.chars().filter(|c| *c != OPEN && *c != CLOSE).collect();
    let mut table = MathTable::default();
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut copied = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'[') => {
                if let Some(end) = input[i + 2..].find("\\]") {
                    let stop = i + 2 + end + 2;
                    out.push_str(&input[copied..i]);
                    table.push(&input[i..stop], true, &mut out);
                    i = stop;
                    copied = i;
                    continue;
                }
                i += 2;
            }
            b'\\' => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                if let Some(end) = find_unescaped(&input, i + 2, "$$") {
                    let stop = end + 2;
                    out.push_str(&input[copied..i]);
                    table.push(&input[i..stop], true, &mut out);
                    i = stop;
                    copied = i;
                    continue;
                }
                i += 2;
            }
            b'$' => {
                match find_unescaped(&input, i + 1, "$") {
                    Some(end) if end > i + 1 => {
                        let stop = end + 1;
                        out.push_str(&input[copied..i]);
                        let inner = &input[i + 1..end];
                        match script_shorthand(inner) {
                            Some(text) => out.push_str(&text),
                            None => table.push(&input[i..stop], false, &mut out),
                        }
                        i = stop;
                        copied = i;
                        continue;
                    }
                    _ => i += 1,
                }
            }
            _ => i += 1,
        }
    }
    if copied < input.len() {
        out.push_str(&input[copied..]);
    }
    (out, table)
}

/// Find `needle` at or after `from`, skipping backslash escapes.
fn find_unescaped(input: &str, from: usize, needle: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if input.as_bytes()[i..].starts_with(needle.as_bytes()) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Rewrite an inline math payload that is only a script shorthand.
///
/// Accepted shapes: `_2`, `_{12}`, `^3`, `^{-1}`, `X_2`, `X_{12}`.
fn script_shorthand(inner: &str) -> Option<String> {
    let (prefix, rest) = match inner.chars().next()? {
        c if c.is_ascii_alphabetic() => (Some(c), &inner[1..]),
        _ => (None, inner),
    };
    let (kind, payload) = if let Some(p) = rest.strip_prefix('_') {
        (ScriptKind::Sub, p)
    } else if let Some(p) = rest.strip_prefix('^') {
        // `x^2` stays math; only the bare `$^2$` form is a shorthand
        if prefix.is_some() {
            return None;
        }
        (ScriptKind::Super, p)
    } else {
        return None;
    };
    let payload = payload
        .strip_prefix('{')
        .and_then(|p| p.strip_suffix('}'))
        .unwrap_or(payload);
    let digits_only = match kind {
        ScriptKind::Sub => payload.chars().all(|c| c.is_ascii_digit()),
        ScriptKind::Super => payload
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == '-'),
    };
    if !digits_only {
        return None;
    }
    let script = to_script(payload, kind)?;
    Some(match prefix {
        Some(c) => format!("{}{}", c, script),
        None => script,
    })
}
