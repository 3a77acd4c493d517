//! LaTeX to HTML transcoder
//!
//! Converts the constrained LaTeX subset used on advent sheets into an HTML
//! fragment. Every entry point follows the same pipeline:
//!
//! 1. math spans are replaced by opaque placeholders ([`math`])
//! 2. markup is rendered, either flat ([`markup`] + paragraph assembly) or
//!    through the structural block scanner ([`blocks`])
//! 3. placeholders are restored, leaving every math span byte-identical
//!
//! The transcoder never fails; problems are reported as warnings.

pub mod blocks;
pub mod markup;
pub mod math;

use serde::{Deserialize, Serialize};

use crate::core::macro_args::{find_group_end, find_macro};
use crate::utils::error::ConversionOutput;

pub use blocks::{assemble_paragraphs, MAX_SCAN_ITERATIONS};
pub use math::{protect_math, MathTable};

/// How body text is broken into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    /// Structural scan: lists, quotes and display math stay whole
    #[default]
    Structured,
    /// Inline rendering followed by blank-line paragraph splitting
    Flat,
}

/// Transcode a short inline field (title, subtitle, key insight, closing).
///
/// No paragraph wrapping is applied; the result is trimmed.
pub fn inline_to_html(text: &str) -> String {
    let (protected, table) = protect_math(text.trim());
    let html = markup::render_inline(&protected);
    table.restore(html.trim())
}

/// Flat transcoding with blank-line paragraph assembly.
pub fn latex_to_html(text: &str) -> String {
    let (protected, table) = protect_math(text);
    let html = assemble_paragraphs(&markup::render_inline(&protected));
    table.restore(&html)
}

/// Transcode body text with the structural block scanner.
pub fn body_to_html(text: &str) -> ConversionOutput {
    body_to_html_with(text, BodyMode::Structured)
}

pub fn body_to_html_with(text: &str, mode: BodyMode) -> ConversionOutput {
    match mode {
        BodyMode::Flat => ConversionOutput::new(latex_to_html(text)),
        BodyMode::Structured => {
            let (protected, table) = protect_math(text);
            let mut scanner = blocks::BlockScanner::new(&table);
            let html = scanner.render(&protected);
            ConversionOutput::with_warnings(table.restore(&html), scanner.into_warnings())
        }
    }
}

/// Byte offset of the first `\section` (starred or not), if any.
pub fn first_section_offset(text: &str) -> Option<usize> {
    find_macro(text, "section").map(|end| end - "\\section".len())
}

/// Transcoded title of the first `\section`, if it has a non-empty one.
pub fn first_section_title(text: &str) -> Option<String> {
    let end = find_macro(text, "section")?;
    let rest = &text[end..];
    let rest = rest.strip_prefix('*').unwrap_or(rest);
    let skipped = rest.len() - rest.trim_start().len();
    let open = text.len() - rest.len() + skipped;
    if !text[open..].starts_with('{') {
        return None;
    }
    let close = find_group_end(text.as_bytes(), open)?;
    let title = inline_to_html(&text[open + 1..close]);
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
