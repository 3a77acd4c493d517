//! Macro argument extraction
//!
//! Locates one fixed macro invocation (the advent sheet macro) and pulls a
//! fixed number of brace-delimited arguments out of it. This is not a LaTeX
//! parser: it follows literal brace nesting only, so unbalanced braces inside
//! verbatim or math content will confuse it.

use serde::{Deserialize, Serialize};

use crate::utils::error::ExtractError;

/// Default macro name of the advent sheet.
pub const SHEET_MACRO: &str = "AdventSheetTwoCol";

/// Macro schema version; fixes the argument arity for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaVersion {
    /// Six arguments; the closing text lives in a trailing comment-delimited block
    Legacy,
    /// Seven arguments; the last one is the closing text
    #[default]
    TwoCol,
}

impl SchemaVersion {
    pub fn arity(self) -> usize {
        match self {
            SchemaVersion::Legacy => 6,
            SchemaVersion::TwoCol => 7,
        }
    }
}

/// Arguments of one sheet invocation, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetArgs {
    pub date_label: String,
    pub title: String,
    pub subtitle: String,
    pub key_insight: String,
    pub body: String,
    /// Only present for [`SchemaVersion::TwoCol`]
    pub closing: Option<String>,
}

impl SheetArgs {
    /// Extract and lay out the sheet arguments of `source`.
    pub fn extract(
        source: &str,
        macro_name: &str,
        schema: SchemaVersion,
    ) -> Result<Self, ExtractError> {
        let args = extract_macro_args(source, macro_name, schema.arity())?;
        Ok(Self::from_args(args, schema))
    }

    fn from_args(args: Vec<String>, schema: SchemaVersion) -> Self {
        let mut it = args.into_iter();
        let mut next = || it.next().unwrap_or_default();
        let date_label = next();
        let _unused = next();
        let title = next();
        let subtitle = next();
        let key_insight = next();
        let body = next();
        let closing = match schema {
            SchemaVersion::Legacy => None,
            SchemaVersion::TwoCol => Some(next()),
        };
        SheetArgs {
            date_label,
            title,
            subtitle,
            key_insight,
            body,
            closing,
        }
    }
}

/// Extract exactly `arity` brace groups following the first `\name`.
///
/// Whitespace and `%` comments between groups are skipped. Group contents are
/// returned verbatim, without trimming.
pub fn extract_macro_args(
    source: &str,
    name: &str,
    arity: usize,
) -> Result<Vec<String>, ExtractError> {
    let start = find_macro(source, name).ok_or_else(|| ExtractError::NotFound {
        name: name.to_string(),
    })?;

    let bytes = source.as_bytes();
    let mut pos = start;
    let mut args = Vec::with_capacity(arity);

    for index in 0..arity {
        pos = skip_space_and_comments(bytes, pos);
        if pos >= bytes.len() {
            return Err(ExtractError::ArityMismatch {
                expected: arity,
                found: args.len(),
            });
        }
        if bytes[pos] != b'{' {
            return Err(ExtractError::MalformedArgument {
                index,
                found: source[pos..].chars().next(),
            });
        }
        let close = find_group_end(bytes, pos)
            .ok_or(ExtractError::UnterminatedArgument { index })?;
        args.push(source[pos + 1..close].to_string());
        pos = close + 1;
    }

    Ok(args)
}

/// Byte offset just past `\name`, for the first occurrence not followed by a letter.
pub fn find_macro(source: &str, name: &str) -> Option<usize> {
    let needle = format!("\\{}", name);
    let bytes = source.as_bytes();
    let mut from = 0usize;
    while let Some(rel) = source[from..].find(&needle) {
        let end = from + rel + needle.len();
        if end >= bytes.len() || !bytes[end].is_ascii_alphabetic() {
            return Some(end);
        }
        from = end;
    }
    None
}

fn skip_space_and_comments(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        match bytes[pos] {
            b'%' => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            b if b.is_ascii_whitespace() => pos += 1,
            _ => break,
        }
    }
    pos
}

/// Index of the `}` closing the group that opens at `open`.
///
/// Escaped braces (`\{`, `\}`) do not count towards nesting.
pub fn find_group_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Strip LaTeX line comments (% ...) while preserving escaped \%.
///
/// Lines that held nothing but a comment are dropped so they do not turn into
/// paragraph breaks; blank lines are kept.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        let cut = comment_start(line);
        let kept = &line[..cut];
        if cut < line.len() && kept.trim().is_empty() {
            continue;
        }
        out.push_str(kept.trim_end());
        out.push('\n');
    }
    if !input.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

fn comment_start(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'%' => return i,
            _ => i += 1,
        }
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_exact_groups() {
        let src = r"\AdventSheetTwoCol{a}{b} {c}";
        let args = extract_macro_args(src, SHEET_MACRO, 3).unwrap();
        assert_eq!(args, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_nested_braces_do_not_truncate() {
        let src = r"\AdventSheetTwoCol{outer {inner} text}";
        let args = extract_macro_args(src, SHEET_MACRO, 1).unwrap();
        assert_eq!(args[0], "outer {inner} text");
    }

    #[test]
    fn test_comments_between_groups() {
        let src = "\\AdventSheetTwoCol % date\n  {Dec 1} % unused {not an arg}\n  {x}";
        let args = extract_macro_args(src, SHEET_MACRO, 2).unwrap();
        assert_eq!(args, vec!["Dec 1", "x"]);
    }

    #[test]
    fn test_escaped_braces_inside_group() {
        let src = r"\AdventSheetTwoCol{set \{1,2\} here}";
        let args = extract_macro_args(src, SHEET_MACRO, 1).unwrap();
        assert_eq!(args[0], r"set \{1,2\} here");
    }

    #[test]
    fn test_not_found() {
        let err = extract_macro_args("no macro here", SHEET_MACRO, 6).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound { .. }));
    }

    #[test]
    fn test_longer_name_is_not_a_match() {
        let src = r"\AdventSheetTwoColumns{a}";
        assert!(find_macro(src, SHEET_MACRO).is_none());
    }

    #[test]
    fn test_malformed_argument() {
        let err = extract_macro_args(r"\AdventSheetTwoCol{a} x{b}", SHEET_MACRO, 2).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MalformedArgument {
                index: 1,
                found: Some('x')
            }
        );
    }

    #[test]
    fn test_unterminated_argument() {
        let err = extract_macro_args(r"\AdventSheetTwoCol{a}{b {c}", SHEET_MACRO, 2).unwrap_err();
        assert_eq!(err, ExtractError::UnterminatedArgument { index: 1 });
    }

    #[test]
    fn test_arity_mismatch() {
        let err = extract_macro_args("\\AdventSheetTwoCol{a}{b}\n", SHEET_MACRO, 7).unwrap_err();
        assert_eq!(
            err,
            ExtractError::ArityMismatch {
                expected: 7,
                found: 2
            }
        );
    }

    #[test]
    fn test_reextraction_is_stable() {
        let src = r"\AdventSheetTwoCol{one}{two {2}}";
        let first = extract_macro_args(src, SHEET_MACRO, 2).unwrap();
        let rebuilt = format!("\\AdventSheetTwoCol{{{}}}{{{}}}", first[0], first[1]);
        let second = extract_macro_args(&rebuilt, SHEET_MACRO, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strip_comments() {
        let src = "keep 50\\% here % drop this\n% whole line\n\nnext";
        assert_eq!(strip_comments(src), "keep 50\\% here\n\nnext");
    }

    #[test]
    fn test_strip_comments_before_extraction() {
        let src = "\\AdventSheetTwoCol{a % hidden }\n b}";
        let stripped = strip_comments(src);
        let args = extract_macro_args(&stripped, SHEET_MACRO, 1).unwrap();
        assert_eq!(args[0], "a\n b");
    }

    #[test]
    fn test_sheet_args_layout() {
        let src = r"\AdventSheetTwoCol{Dec 1}{}{Title}{Sub}{Insight}{Body}{Bye}";
        let args = SheetArgs::extract(src, SHEET_MACRO, SchemaVersion::TwoCol).unwrap();
        assert_eq!(args.title, "Title");
        assert_eq!(args.body, "Body");
        assert_eq!(args.closing.as_deref(), Some("Bye"));

        let legacy = SheetArgs::extract(src, SHEET_MACRO, SchemaVersion::Legacy).unwrap();
        assert_eq!(legacy.key_insight, "Insight");
        assert_eq!(legacy.closing, None);
    }
}
