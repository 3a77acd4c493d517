//! Block structure: paragraph assembly and the structural body scanner
//!
//! The flat path renders everything inline and then splits the result on
//! blank lines. The structural path walks the body left to right, stopping at
//! the next heading, known environment or display-math span, so that lists
//! and quotes are never cut in half by the paragraph splitter.

use log::warn;

use super::markup::{bracket_group, render_inline};
use super::math::{parse_placeholder, MathTable};
use crate::core::macro_args::find_group_end;
use crate::data::maps::{CommandToken, EnvKind, ListKind, COMMANDS, ENVIRONMENTS};
use crate::utils::error::ConversionWarning;

/// Upper bound on scanner steps for one body.
pub const MAX_SCAN_ITERATIONS: usize = 1000;

/// Paragraph candidates starting with one of these are already block-level.
const BLOCK_PREFIXES: &[&str] = &[
    "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<ul", "<ol", "<dl", "<blockquote", "<p>", "<p ",
    "<div", "<table",
];

pub fn is_block_html(candidate: &str) -> bool {
    BLOCK_PREFIXES.iter().any(|p| candidate.starts_with(p))
}

/// Split text into paragraph candidates at blank lines.
///
/// Runs of several blank lines count as one break; candidates are trimmed.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }
    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

/// Wrap non-block candidates in `<p>` and join them with newlines.
pub fn assemble_paragraphs(html: &str) -> String {
    split_paragraphs(html)
        .into_iter()
        .map(|p| {
            if is_block_html(&p) {
                p
            } else {
                format!("<p>{}</p>", p)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Paragraph(String),
    Html(String),
}

impl Block {
    fn to_html(&self) -> String {
        match self {
            Block::Paragraph(text) => format!("<p>{}</p>", text),
            Block::Html(html) => html.clone(),
        }
    }
}

fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::to_html)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Heading { level: u8, name_end: usize },
    Environment { kind: EnvKind, name_start: usize, content_start: usize },
    DisplayMath { end: usize },
}

/// Shared state for one body scan, including the iteration budget.
pub struct BlockScanner<'t> {
    table: &'t MathTable,
    iterations: usize,
    exhausted: bool,
    warnings: Vec<ConversionWarning>,
}

impl<'t> BlockScanner<'t> {
    pub fn new(table: &'t MathTable) -> Self {
        Self {
            table,
            iterations: 0,
            exhausted: false,
            warnings: Vec::new(),
        }
    }

    /// Render a math-protected body; returns placeholder-bearing HTML.
    pub fn render(&mut self, src: &str) -> String {
        let blocks = self.scan(src);
        join_blocks(&blocks)
    }

    pub fn into_warnings(self) -> Vec<ConversionWarning> {
        self.warnings
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(ConversionWarning::new(message));
    }

    fn scan(&mut self, src: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pos = 0usize;

        while pos < src.len() {
            if self.iterations >= MAX_SCAN_ITERATIONS {
                if !self.exhausted {
                    self.exhausted = true;
                    self.warn(format!(
                        "scan limit of {} steps reached, remaining {} bytes rendered flat",
                        MAX_SCAN_ITERATIONS,
                        src.len() - pos
                    ));
                }
                let rest = assemble_paragraphs(&render_inline(&src[pos..]));
                if !rest.is_empty() {
                    blocks.push(Block::Html(rest));
                }
                break;
            }
            self.iterations += 1;

            pos += src[pos..].len() - src[pos..].trim_start().len();
            if pos >= src.len() {
                break;
            }

            match self.next_marker(src, pos) {
                Some((at, marker)) if at == pos => {
                    pos = self.block_at(src, pos, marker, &mut blocks);
                }
                Some((at, _)) => {
                    push_paragraphs(&src[pos..at], &mut blocks);
                    pos = at;
                }
                None => {
                    push_paragraphs(&src[pos..], &mut blocks);
                    pos = src.len();
                }
            }
        }

        blocks
    }

    /// Emit the structure starting at `pos`; returns the position after it.
    fn block_at(
        &mut self,
        src: &str,
        pos: usize,
        marker: Marker,
        blocks: &mut Vec<Block>,
    ) -> usize {
        match marker {
            Marker::Heading { level, name_end } => {
                let mut cursor = name_end;
                if src[cursor..].starts_with('*') {
                    cursor += 1;
                }
                cursor += src[cursor..].len() - src[cursor..].trim_start().len();
                let close = if src[cursor..].starts_with('{') {
                    find_group_end(src.as_bytes(), cursor)
                } else {
                    None
                };
                match close {
                    Some(close) => {
                        let title = render_inline(src[cursor + 1..close].trim());
                        blocks.push(Block::Html(format!("<h{0}>{1}</h{0}>", level, title)));
                        close + 1
                    }
                    None => self.degrade(src, pos, name_end, blocks),
                }
            }
            Marker::DisplayMath { end } => {
                blocks.push(Block::Paragraph(src[pos..end].to_string()));
                end
            }
            Marker::Environment {
                kind,
                name_start,
                content_start,
            } => {
                let name_end = content_start - 1;
                let name = src[name_start..name_end].trim();
                let Some((content_end, after)) = find_environment_end(src, content_start, name)
                else {
                    self.warn(format!(
                        "unterminated \\begin{{{}}}, remainder rendered as plain paragraphs",
                        name
                    ));
                    blocks.push(Block::Html(assemble_paragraphs(&render_inline(&src[pos..]))));
                    return src.len();
                };
                let content = &src[content_start..content_end];
                match kind {
                    EnvKind::List(list) => {
                        let html = self.render_list(list, content);
                        blocks.push(Block::Html(html));
                    }
                    EnvKind::Quote => {
                        let inner = self.render_fragment(content);
                        blocks.push(Block::Html(format!("<blockquote>{}</blockquote>", inner)));
                    }
                    EnvKind::Bibliography => {}
                }
                after
            }
        }
    }

    /// Treat a malformed construct as text up to the next marker.
    fn degrade(&mut self, src: &str, pos: usize, from: usize, blocks: &mut Vec<Block>) -> usize {
        let stop = self
            .next_marker(src, from)
            .map(|(at, _)| at)
            .unwrap_or(src.len());
        push_paragraphs(&src[pos..stop], blocks);
        stop
    }

    /// Render content that sits inside a list item or quote.
    ///
    /// A single paragraph is returned without its `<p>` wrapper.
    fn render_fragment(&mut self, content: &str) -> String {
        let blocks = self.scan(content);
        match blocks.as_slice() {
            [Block::Paragraph(text)] => text.clone(),
            _ => join_blocks(&blocks),
        }
    }

    fn render_list(&mut self, kind: ListKind, content: &str) -> String {
        let mut body = content;
        if let Some((_, used)) = bracket_group(body.trim_start()) {
            let skipped = body.len() - body.trim_start().len();
            body = &body[skipped + used..];
        }
        let tag = kind.tag();
        let mut html = format!("<{}>", tag);
        for item in split_items(body) {
            let text = self.render_fragment(item.body.trim());
            let label = item.label.map(|l| render_inline(l.trim()));
            let entry = match (kind, label) {
                (ListKind::Definition, Some(label)) => {
                    format!("<dt>{}</dt><dd>{}</dd>", label, text)
                }
                (ListKind::Definition, None) => format!("<dd>{}</dd>", text),
                (_, Some(label)) => format!("<li><strong>{}</strong> {}</li>", label, text),
                (_, None) => format!("<li>{}</li>", text),
            };
            html.push('\n');
            html.push_str(&entry);
        }
        html.push_str(&format!("\n</{}>", tag));
        html
    }

    /// Find the next structural marker at or after `from`.
    fn next_marker(&self, src: &str, from: usize) -> Option<(usize, Marker)> {
        let bytes = src.as_bytes();
        let mut i = from;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    let name_len = bytes[i + 1..]
                        .iter()
                        .take_while(|b| b.is_ascii_alphabetic())
                        .count();
                    if name_len == 0 {
                        i += 2;
                        continue;
                    }
                    let name_end = i + 1 + name_len;
                    let name = &src[i + 1..name_end];
                    match COMMANDS.get(name) {
                        Some(CommandToken::Heading(level)) => {
                            return Some((
                                i,
                                Marker::Heading {
                                    level: *level,
                                    name_end,
                                },
                            ));
                        }
                        Some(CommandToken::Begin) if src[name_end..].starts_with('{') => {
                            if let Some(close) = find_group_end(bytes, name_end) {
                                let env = src[name_end + 1..close].trim();
                                if let Some(kind) = ENVIRONMENTS.get(env) {
                                    return Some((
                                        i,
                                        Marker::Environment {
                                            kind: *kind,
                                            name_start: name_end + 1,
                                            content_start: close + 1,
                                        },
                                    ));
                                }
                            }
                        }
                        _ => {}
                    }
                    i = name_end;
                }
                0xEE => {
                    if let Some((index, len)) = parse_placeholder(&src[i..]) {
                        let display = self.table.get(index).map(|m| m.display).unwrap_or(false);
                        if display && !inside_html_block(&src[..i]) {
                            return Some((i, Marker::DisplayMath { end: i + len }));
                        }
                        i += len;
                    } else {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
        None
    }
}

/// Tags whose content is already rendered text.
const TEXT_BLOCK_TAGS: &[&str] = &[
    "p", "li", "dt", "dd", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Whether `prefix` leaves an HTML text block open at its end.
///
/// Display math inside such a block was placed there by an earlier
/// rendering and must stay where it is.
fn inside_html_block(prefix: &str) -> bool {
    let mut depth = 0usize;
    let mut rest = prefix;
    while let Some(at) = rest.find('<') {
        rest = &rest[at + 1..];
        let (closing, tag) = match rest.strip_prefix('/') {
            Some(tag) => (true, tag),
            None => (false, rest),
        };
        let name_len = tag.bytes().take_while(|b| b.is_ascii_alphanumeric()).count();
        let name = &tag[..name_len];
        let terminated = matches!(tag[name_len..].chars().next(), Some('>') | Some(' '));
        if !terminated || !TEXT_BLOCK_TAGS.contains(&name) {
            continue;
        }
        if closing {
            depth = depth.saturating_sub(1);
        } else {
            depth += 1;
        }
    }
    depth > 0
}

fn push_paragraphs(text: &str, blocks: &mut Vec<Block>) {
    for paragraph in split_paragraphs(text) {
        let html = render_inline(&paragraph);
        if html.trim().is_empty() {
            continue;
        }
        if is_block_html(&html) {
            blocks.push(Block::Html(html));
        } else {
            blocks.push(Block::Paragraph(html));
        }
    }
}

/// Locate `\end{name}` matching an environment whose content starts at `from`.
///
/// Returns (content end, position after the `\end{..}`).
fn find_environment_end(src: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let begin_tag = format!("\\begin{{{}}}", name);
    let end_tag = format!("\\end{{{}}}", name);
    let mut depth = 1usize;
    let mut cursor = from;
    loop {
        let next_end = src[cursor..].find(&end_tag)? + cursor;
        match src[cursor..].find(&begin_tag).map(|p| p + cursor) {
            Some(next_begin) if next_begin < next_end => {
                depth += 1;
                cursor = next_begin + begin_tag.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some((next_end, next_end + end_tag.len()));
                }
                cursor = next_end + end_tag.len();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListItem<'a> {
    label: Option<&'a str>,
    body: &'a str,
}

/// Split list content on top-level `\item` markers.
///
/// Markers inside nested environments or brace groups belong to the nested
/// content. Text before the first marker is ignored.
fn split_items(content: &str) -> Vec<ListItem<'_>> {
    let bytes = content.as_bytes();
    let mut starts = Vec::new();
    let mut env_depth = 0usize;
    let mut brace_depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let name_len = bytes[i + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphabetic())
                    .count();
                if name_len == 0 {
                    i += 2;
                    continue;
                }
                let name_end = i + 1 + name_len;
                match &content[i + 1..name_end] {
                    "begin" => env_depth += 1,
                    "end" => env_depth = env_depth.saturating_sub(1),
                    "item" if env_depth == 0 && brace_depth == 0 => starts.push((i, name_end)),
                    _ => {}
                }
                i = name_end;
            }
            b'{' => {
                brace_depth += 1;
                i += 1;
            }
            b'}' => {
                brace_depth = brace_depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }

    let mut items = Vec::with_capacity(starts.len());
    for (idx, &(_, marker_end)) in starts.iter().enumerate() {
        let stop = starts.get(idx + 1).map(|s| s.0).unwrap_or(content.len());
        let mut body_start = marker_end;
        let after = &content[marker_end..stop];
        let trimmed = after.trim_start_matches([' ', '\t']);
        let mut label = None;
        if let Some((inner, used)) = bracket_group(trimmed) {
            label = Some(inner);
            body_start = marker_end + (after.len() - trimmed.len()) + used;
        }
        items.push(ListItem {
            label,
            body: &content[body_start..stop],
        });
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::latex2html::math::protect_math;
    use pretty_assertions::assert_eq;

    fn scan(src: &str) -> (String, Vec<ConversionWarning>) {
        let (protected, table) = protect_math(src);
        let mut scanner = BlockScanner::new(&table);
        let html = scanner.render(&protected);
        (table.restore(&html), scanner.into_warnings())
    }

    #[test]
    fn test_split_paragraphs_collapses_blank_runs() {
        let parts = split_paragraphs("one\nline\n\n\n\ntwo\n   \nthree");
        assert_eq!(parts, vec!["one\nline", "two", "three"]);
    }

    #[test]
    fn test_assemble_passes_blocks_through() {
        let html = assemble_paragraphs("<h3>Title</h3>\n\nSome text\n\n<ul><li>a</li></ul>");
        assert_eq!(html, "<h3>Title</h3>\n<p>Some text</p>\n<ul><li>a</li></ul>");
    }

    #[test]
    fn test_structured_sections_and_paragraphs() {
        let (html, warnings) = scan("Lead in.\n\n\\section*{First}\nBody text.\n\nMore.");
        assert!(warnings.is_empty());
        assert_eq!(
            html,
            "<p>Lead in.</p>\n<h3>First</h3>\n<p>Body text.</p>\n<p>More.</p>"
        );
    }

    #[test]
    fn test_list_not_fragmented_by_blank_lines() {
        let src = "\\begin{itemize}\n\\item First\n\n\\item Second\n\\end{itemize}";
        let (html, _) = scan(src);
        assert_eq!(html, "<ul>\n<li>First</li>\n<li>Second</li>\n</ul>");
    }

    #[test]
    fn test_nested_lists() {
        let src = "\\begin{enumerate}\n\\item Outer\n\\begin{itemize}\\item Inner\\end{itemize}\n\\item Last\n\\end{enumerate}";
        let (html, _) = scan(src);
        assert_eq!(
            html,
            "<ol>\n<li><p>Outer</p>\n<ul>\n<li>Inner</li>\n</ul></li>\n<li>Last</li>\n</ol>"
        );
    }

    #[test]
    fn test_description_list() {
        let src = "\\begin{description}\n\\item[Octonions] Eight dimensions.\n\\item[$G_2$] Automorphisms.\n\\end{description}";
        let (html, _) = scan(src);
        assert_eq!(
            html,
            "<dl>\n<dt>Octonions</dt><dd>Eight dimensions.</dd>\n<dt>G₂</dt><dd>Automorphisms.</dd>\n</dl>"
        );
    }

    #[test]
    fn test_quote_block() {
        let (html, _) = scan("\\begin{quote}\n\\emph{Stay} curious.\n\\end{quote}");
        assert_eq!(html, "<blockquote><em>Stay</em> curious.</blockquote>");
    }

    #[test]
    fn test_display_math_own_paragraph() {
        let (html, _) = scan("Consider\n\\[ a^2 + b^2 = c^2 \\]\nwhich holds.");
        assert_eq!(
            html,
            "<p>Consider</p>\n<p>\\[ a^2 + b^2 = c^2 \\]</p>\n<p>which holds.</p>"
        );
    }

    #[test]
    fn test_rendered_output_is_stable() {
        let src = "Intro.\n\n\\section*{S}\n\\begin{itemize}\n\\item a\n\\item \\[y\\]\n\\end{itemize}\n\\[x\\]\n\\begin{quote}q\\end{quote}";
        let (once, _) = scan(src);
        assert_eq!(
            once,
            "<p>Intro.</p>\n<h3>S</h3>\n<ul>\n<li>a</li>\n<li>\\[y\\]</li>\n</ul>\n<p>\\[x\\]</p>\n<blockquote>q</blockquote>"
        );
        let (twice, warnings) = scan(&once);
        assert_eq!(twice, once);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_inside_html_block() {
        assert!(inside_html_block("<p>text "));
        assert!(inside_html_block("<ul>\n<li>a</li>\n<li>"));
        assert!(!inside_html_block("<p>a</p>\n<ul>\n"));
        assert!(!inside_html_block("plain a < b and <pre>"));
    }

    #[test]
    fn test_bibliography_removed_from_body() {
        let (html, _) =
            scan("Text.\n\\begin{thebibliography}{9}\n\\bibitem{k} Ref.\n\\end{thebibliography}");
        assert_eq!(html, "<p>Text.</p>");
    }

    #[test]
    fn test_unterminated_environment_degrades() {
        let (html, warnings) = scan("Intro.\n\n\\begin{itemize}\n\\item dangling");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("unterminated"));
        assert_eq!(html, "<p>Intro.</p>\n<ul><li>dangling</li></ul>");
    }

    #[test]
    fn test_iteration_bound_truncates_with_warning() {
        let mut src = String::new();
        for i in 0..(MAX_SCAN_ITERATIONS + 50) {
            src.push_str(&format!("\\section*{{S{}}}\n", i));
        }
        let (html, warnings) = scan(&src);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("scan limit"));
        assert_eq!(html.matches("<h3>").count(), MAX_SCAN_ITERATIONS + 50);
        assert!(html.ends_with("<h3>S1049</h3>"));
    }

    #[test]
    fn test_split_items_ignores_nested_markers() {
        let items = split_items("\\item[a] one \\begin{itemize}\\item x\\end{itemize}\n\\item two");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, Some("a"));
        assert!(items[0].body.contains("\\item x"));
        assert_eq!(items[1].body.trim(), "two");
    }

    #[test]
    fn test_find_environment_end_nested() {
        let src = "\\begin{quote}a\\begin{quote}b\\end{quote}c\\end{quote}d";
        let from = "\\begin{quote}".len();
        let (end, after) = find_environment_end(src, from, "quote").unwrap();
        assert_eq!(&src[from..end], "a\\begin{quote}b\\end{quote}c");
        assert_eq!(&src[after..], "d");
    }
}
