//! Inline markup scanner
//!
//! A single left-to-right pass over math-protected text. Control sequences are
//! looked up in [`COMMANDS`]; the output of one rule is never re-scanned by
//! another, so rule order cannot leak between substitutions.
//!
//! Block environments met here are rendered in place (flat rendering): the
//! structured body scanner in [`super::blocks`] claims them first whenever it
//! is in charge.

use crate::core::macro_args::find_group_end;
use crate::data::maps::{
    to_script_lossy, CommandToken, EnvKind, ListKind, COMMANDS, ENVIRONMENTS, ESCAPED_CHARS,
    UMLAUTS,
};

/// Render math-protected LaTeX text to an HTML fragment.
pub fn render_inline(src: &str) -> String {
    let mut scanner = Scanner::new(src);
    scanner.run();
    scanner.finish()
}

struct ListFrame {
    kind: ListKind,
    open_item: Option<&'static str>,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    out: String,
    lists: Vec<ListFrame>,
    quotes: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner {
            src,
            pos: 0,
            out: String::with_capacity(src.len()),
            lists: Vec::new(),
            quotes: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.control_sequence(),
                '`' if self.rest().starts_with("``") => {
                    self.out.push('"');
                    self.pos += 2;
                }
                '\'' if self.rest().starts_with("''") => {
                    self.out.push('"');
                    self.pos += 2;
                }
                '-' => self.dashes(),
                _ => {
                    self.out.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn finish(mut self) -> String {
        while !self.lists.is_empty() {
            self.close_list();
        }
        while self.quotes > 0 {
            self.close_quote();
        }
        self.out
    }

    fn dashes(&mut self) {
        let mut run = self.rest().bytes().take_while(|b| *b == b'-').count();
        self.pos += run;
        while run >= 3 {
            self.out.push('—');
            run -= 3;
        }
        match run {
            2 => self.out.push('–'),
            1 => self.out.push('-'),
            _ => {}
        }
    }

    fn control_sequence(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let Some(c) = self.peek() else {
            self.out.push('\\');
            return;
        };
        match c {
            '\\' => {
                self.pos += 1;
                self.out.push_str("<br>");
                if self.rest().starts_with('[') {
                    self.bracket_arg();
                }
            }
            '"' => self.umlaut(),
            c if ESCAPED_CHARS.contains_key(&c) => {
                if let Some(lit) = ESCAPED_CHARS.get(&c) {
                    self.out.push(*lit);
                }
                self.pos += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let src = self.src;
                let len = self
                    .rest()
                    .bytes()
                    .take_while(|b| b.is_ascii_alphabetic())
                    .count();
                let name = &src[self.pos..self.pos + len];
                self.pos += len;
                self.command(name, start);
            }
            other => {
                self.out.push('\\');
                self.out.push(other);
                self.pos += other.len_utf8();
            }
        }
    }

    fn umlaut(&mut self) {
        // positioned on the '"'
        let rest = &self.rest()[1..];
        let mut chars = rest.chars();
        let (letter, consumed) = match chars.next() {
            Some('{') => match (chars.next(), chars.next()) {
                (Some(l), Some('}')) => (Some(l), l.len_utf8() + 2),
                _ => (None, 0),
            },
            Some(l) => (Some(l), l.len_utf8()),
            None => (None, 0),
        };
        match letter.and_then(|l| UMLAUTS.get(&l)) {
            Some(mapped) => {
                self.out.push(*mapped);
                self.pos += 1 + consumed;
            }
            None => {
                self.out.push_str("\\\"");
                self.pos += 1;
            }
        }
    }

    fn command(&mut self, name: &str, start: usize) {
        match COMMANDS.get(name).copied() {
            Some(CommandToken::Heading(level)) => {
                if self.rest().starts_with('*') {
                    self.pos += 1;
                }
                match self.braced_arg() {
                    Some(title) => {
                        let inner = render_inline(title.trim());
                        self.out
                            .push_str(&format!("<h{0}>{1}</h{0}>", level, inner));
                    }
                    None => self.verbatim_from(start),
                }
            }
            Some(CommandToken::Wrap(tag)) => match self.braced_arg() {
                Some(arg) => {
                    let inner = render_inline(arg);
                    self.out.push_str(&format!("<{0}>{1}</{0}>", tag, inner));
                }
                None => self.verbatim_from(start),
            },
            Some(CommandToken::Initial) => {
                let first = self.braced_arg();
                let second = first.and_then(|_| self.braced_arg());
                match (first, second) {
                    (Some(a), Some(b)) => {
                        let text = format!("{}{}", render_inline(a), render_inline(b));
                        self.out.push_str(&text);
                    }
                    _ => self.verbatim_from(start),
                }
            }
            Some(CommandToken::Script(kind)) => match self.braced_arg() {
                Some(arg) => {
                    let mapped = to_script_lossy(arg.trim(), kind);
                    self.out.push_str(&mapped);
                }
                None => self.verbatim_from(start),
            },
            Some(CommandToken::Literal(text)) => {
                self.out.push_str(text);
                if self.rest().starts_with("{}") {
                    self.pos += 2;
                }
            }
            Some(CommandToken::Item) => self.item(start),
            Some(CommandToken::Begin) => self.begin(start),
            Some(CommandToken::End) => self.end(start),
            None => self.unknown_command(start),
        }
    }

    /// Copy an unrecognized command and its adjacent `[..]`/`{..}` groups untouched.
    fn unknown_command(&mut self, start: usize) {
        loop {
            let rest = self.rest();
            let next = if rest.starts_with('[') {
                bracket_group(rest).map(|(_, used)| self.pos + used)
            } else if rest.starts_with('{') {
                find_group_end(self.src.as_bytes(), self.pos).map(|close| close + 1)
            } else {
                None
            };
            match next {
                Some(pos) => self.pos = pos,
                None => break,
            }
        }
        self.verbatim_from(start);
    }

    fn verbatim_from(&mut self, start: usize) {
        self.out.push_str(&self.src[start..self.pos]);
    }

    fn skip_inline_space(&mut self) {
        let n = self
            .rest()
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        self.pos += n;
    }

    fn skip_whitespace(&mut self) {
        let n = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.pos += n;
    }

    /// Consume `{..}` at the cursor (after optional spaces) and return its inner text.
    fn braced_arg(&mut self) -> Option<&'a str> {
        let save = self.pos;
        self.skip_inline_space();
        if !self.rest().starts_with('{') {
            self.pos = save;
            return None;
        }
        match find_group_end(self.src.as_bytes(), self.pos) {
            Some(close) => {
                let inner = &self.src[self.pos + 1..close];
                self.pos = close + 1;
                Some(inner)
            }
            None => {
                self.pos = save;
                None
            }
        }
    }

    /// Consume `[..]` at the cursor and return its inner text.
    fn bracket_arg(&mut self) -> Option<&'a str> {
        let (inner, used) = bracket_group(self.rest())?;
        self.pos += used;
        Some(inner)
    }

    fn trim_output_end(&mut self) {
        let len = self.out.trim_end().len();
        self.out.truncate(len);
    }

    fn item(&mut self, start: usize) {
        let Some(kind) = self.lists.last().map(|f| f.kind) else {
            self.verbatim_from(start);
            return;
        };
        self.close_item();
        self.skip_inline_space();
        let label = if self.rest().starts_with('[') {
            self.bracket_arg().map(render_inline)
        } else {
            None
        };
        let close = match (kind, label) {
            (ListKind::Definition, Some(label)) => {
                self.out.push_str(&format!("<dt>{}</dt><dd>", label.trim()));
                "</dd>"
            }
            (ListKind::Definition, None) => {
                self.out.push_str("<dd>");
                "</dd>"
            }
            (_, Some(label)) => {
                self.out
                    .push_str(&format!("<li><strong>{}</strong> ", label.trim()));
                "</li>"
            }
            (_, None) => {
                self.out.push_str("<li>");
                "</li>"
            }
        };
        if let Some(frame) = self.lists.last_mut() {
            frame.open_item = Some(close);
        }
        self.skip_whitespace();
    }

    fn close_item(&mut self) {
        let open = self.lists.last_mut().and_then(|f| f.open_item.take());
        if let Some(close) = open {
            self.trim_output_end();
            self.out.push_str(close);
        }
    }

    fn close_list(&mut self) {
        self.close_item();
        if let Some(frame) = self.lists.pop() {
            self.out.push_str(&format!("</{}>", frame.kind.tag()));
        }
    }

    fn close_quote(&mut self) {
        self.trim_output_end();
        self.out.push_str("</blockquote>");
        self.quotes -= 1;
    }

    fn begin(&mut self, start: usize) {
        let Some(name) = self.braced_arg() else {
            self.verbatim_from(start);
            return;
        };
        match ENVIRONMENTS.get(name.trim()).copied() {
            Some(EnvKind::List(kind)) => {
                self.skip_inline_space();
                if self.rest().starts_with('[') {
                    self.bracket_arg();
                }
                self.out.push_str(&format!("<{}>", kind.tag()));
                self.lists.push(ListFrame {
                    kind,
                    open_item: None,
                });
                self.skip_whitespace();
            }
            Some(EnvKind::Quote) => {
                self.out.push_str("<blockquote>");
                self.quotes += 1;
                self.skip_whitespace();
            }
            Some(EnvKind::Bibliography) => {
                let end_tag = format!("\\end{{{}}}", name.trim());
                self.pos = match self.rest().find(&end_tag) {
                    Some(at) => self.pos + at + end_tag.len(),
                    None => self.src.len(),
                };
            }
            None => self.verbatim_from(start),
        }
    }

    fn end(&mut self, start: usize) {
        let Some(name) = self.braced_arg() else {
            self.verbatim_from(start);
            return;
        };
        match ENVIRONMENTS.get(name.trim()).copied() {
            Some(EnvKind::List(kind)) if self.lists.last().map(|f| f.kind) == Some(kind) => {
                self.close_list();
            }
            Some(EnvKind::Quote) if self.quotes > 0 => self.close_quote(),
            _ => self.verbatim_from(start),
        }
    }
}

/// Parse `[..]` at the start of `input`, honoring nested braces.
///
/// Returns the inner text and the number of bytes consumed.
pub fn bracket_group(input: &str) -> Option<(&str, usize)> {
    if !input.starts_with('[') {
        return None;
    }
    let mut brace_depth = 0usize;
    for (idx, ch) in input.char_indices().skip(1) {
        match ch {
            '{' => brace_depth += 1,
            '}' => brace_depth = brace_depth.saturating_sub(1),
            ']' if brace_depth == 0 => return Some((&input[1..idx], idx + 1)),
            _ => {}
        }
    }
    None
}
