//! Bibliography extraction
//!
//! References come from a `thebibliography` environment when one exists.
//! Otherwise a heuristic looks for `AuthorYear Description` runs in the body
//! text; short matches are treated as false positives.

use fxhash::FxHashSet;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::latex2html::inline_to_html;
use super::latex2html::markup::bracket_group;
use super::macro_args::{find_group_end, find_macro};
use crate::utils::error::ConversionWarning;

/// Heuristic entries this short (in characters) are discarded.
pub const MIN_REFERENCE_LEN: usize = 20;

const BIB_ENV: &str = "thebibliography";

lazy_static! {
    static ref CITATION_KEY: Regex = Regex::new(r"[A-Z][a-zA-Z]+\d{4}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// One bibliography entry; `text` is transcoded HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub key: String,
    pub text: String,
}

impl Reference {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Extract references from a comment-stripped document.
///
/// `document` is searched for the bibliography environment; `body` is the
/// text the fallback heuristic scans.
pub fn extract_references(
    document: &str,
    body: &str,
) -> (Vec<Reference>, Vec<ConversionWarning>) {
    let mut collector = Collector::default();
    match bibliography_content(document) {
        Some(content) => collect_bibitems(content, &mut collector),
        None => collect_heuristic(body, &mut collector),
    }
    (collector.entries, collector.warnings)
}

#[derive(Default)]
struct Collector {
    entries: Vec<Reference>,
    seen: FxHashSet<String>,
    warnings: Vec<ConversionWarning>,
}

impl Collector {
    fn push(&mut self, key: &str, raw_text: &str) {
        let key = key.trim();
        if !self.seen.insert(key.to_string()) {
            let message = format!("duplicate reference key '{}' ignored", key);
            warn!("{}", message);
            self.warnings.push(ConversionWarning::new(message));
            return;
        }
        let normalized = WHITESPACE.replace_all(raw_text.trim(), " ");
        self.entries
            .push(Reference::new(key, inline_to_html(&normalized)));
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(ConversionWarning::new(message));
    }
}

/// Inner text of the first bibliography environment, after its width argument.
fn bibliography_content(document: &str) -> Option<&str> {
    let begin = format!("\\begin{{{}}}", BIB_ENV);
    let end = format!("\\end{{{}}}", BIB_ENV);
    let start = document.find(&begin)? + begin.len();
    let mut rest = &document[start..];

    let trimmed = rest.trim_start();
    if trimmed.starts_with('{') {
        let open = document.len() - trimmed.len();
        if let Some(close) = find_group_end(document.as_bytes(), open) {
            rest = &document[close + 1..];
        }
    }
    let stop = rest.find(&end).unwrap_or(rest.len());
    Some(&rest[..stop])
}

fn collect_bibitems(content: &str, collector: &mut Collector) {
    let mut cursor = 0usize;
    while let Some(after_name) = find_macro(&content[cursor..], "bibitem").map(|p| p + cursor) {
        let mut pos = after_name;
        let rest = &content[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if let Some((_, used)) = bracket_group(trimmed) {
            pos += used;
        }
        let rest = &content[pos..];
        pos += rest.len() - rest.trim_start().len();

        let key_close = if content[pos..].starts_with('{') {
            find_group_end(content.as_bytes(), pos)
        } else {
            None
        };
        let Some(key_close) = key_close else {
            collector.warn(format!("\\bibitem without a key near byte {}", after_name));
            cursor = pos;
            continue;
        };

        let key = &content[pos + 1..key_close];
        let text_start = key_close + 1;
        let text_end = find_macro(&content[text_start..], "bibitem")
            .map(|p| text_start + p - "\\bibitem".len())
            .unwrap_or(content.len());
        collector.push(key, &content[text_start..text_end]);
        cursor = text_end;
    }
}

fn collect_heuristic(body: &str, collector: &mut Collector) {
    let mut cursor = 0usize;
    while let Some(key) = CITATION_KEY.find_at(body, cursor) {
        let after = &body[key.end()..];
        let text_start = key.end() + (after.len() - after.trim_start().len());
        let first = match body[text_start..].chars().next() {
            Some(c) if c.is_ascii_uppercase() => c,
            _ => {
                cursor = key.end();
                continue;
            }
        };

        let search_from = text_start + first.len_utf8();
        let next_key = CITATION_KEY
            .find_at(body, search_from)
            .map(|m| m.start())
            .unwrap_or(body.len());
        let blank = body[search_from..]
            .find("\n\n")
            .map(|p| search_from + p)
            .unwrap_or(body.len());
        let text_end = next_key.min(blank);

        let text = WHITESPACE.replace_all(body[text_start..text_end].trim(), " ");
        if text.chars().count() > MIN_REFERENCE_LEN {
            collector.push(key.as_str(), &text);
        }
        cursor = text_end;
    }
}
