//! Document assembler: one source file in, one day record out.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use super::config::CalendarConfig;
use super::dates::resolve_day;
use super::record::DayRecord;
use crate::core::bibliography::extract_references;
use crate::core::latex2html::{
    body_to_html_with, first_section_offset, first_section_title, inline_to_html,
};
use crate::core::macro_args::{strip_comments, SchemaVersion, SheetArgs};
use crate::utils::error::{AdventError, AdventResult, ConversionWarning};

lazy_static! {
    /// Closing text of six-argument sheets, kept between two comment markers.
    static ref LEGACY_CLOSING: Regex = Regex::new(r"(?s)\}\s*%\s*end\s*#6\s*(.+?)%\s*#7").unwrap();
}

/// A record plus the non-fatal issues met while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDay {
    pub record: DayRecord,
    pub warnings: Vec<ConversionWarning>,
}

pub struct Assembler<'c> {
    config: &'c CalendarConfig,
}

impl<'c> Assembler<'c> {
    pub fn new(config: &'c CalendarConfig) -> Self {
        Self { config }
    }

    /// Read and assemble one file.
    pub fn assemble_file(&self, path: &Path) -> AdventResult<AssembledDay> {
        // checked before reading so that skips never touch the file
        resolve_day(path, self.config)?;
        let source = fs::read_to_string(path).map_err(|e| AdventError::io(path, &e))?;
        self.assemble(path, &source)
    }

    /// Assemble a record from `source`, named by `path`.
    pub fn assemble(&self, path: &Path, source: &str) -> AdventResult<AssembledDay> {
        let day = resolve_day(path, self.config)?;
        let file = path.display().to_string();
        debug!("{}: day {} ({})", file, day.day, day.iso());

        let stripped = strip_comments(source);
        let args = SheetArgs::extract(&stripped, &self.config.macro_name, self.config.schema)
            .map_err(|e| AdventError::extract(file.as_str(), e))?;

        let mut warnings = Vec::new();
        let mode = self.config.body_mode;

        let body = args.body.trim();
        let (intro, content) = match first_section_offset(body) {
            Some(offset) => {
                let intro = body_to_html_with(body[..offset].trim(), mode);
                let content = body_to_html_with(&body[offset..], mode);
                warnings.extend(intro.warnings);
                warnings.extend(content.warnings);
                (intro.content, content.content)
            }
            None => {
                let content = body_to_html_with(body, mode);
                warnings.extend(content.warnings);
                (String::new(), content.content)
            }
        };

        let mut title = inline_to_html(&args.title);
        if title.is_empty() {
            title = first_section_title(body).unwrap_or_else(|| format!("Day {}", day.day));
        }

        let closing = match self.config.schema {
            SchemaVersion::TwoCol => inline_to_html(args.closing.as_deref().unwrap_or_default()),
            SchemaVersion::Legacy => legacy_closing(source)
                .map(|raw| inline_to_html(&strip_comments(raw)))
                .unwrap_or_default(),
        };

        let (references, ref_warnings) = extract_references(&stripped, body);
        warnings.extend(ref_warnings);

        let kind = day.kind();
        let record = DayRecord {
            day: day.day,
            date: day.iso(),
            date_display: day.display(),
            title,
            subtitle: inline_to_html(&args.subtitle),
            key_insight: inline_to_html(&args.key_insight),
            content,
            closing,
            day_type: kind.type_label(day.date),
            special: kind.special_label(),
            central_formula: String::new(),
            dependencies: String::new(),
            is_locked: day.day > self.config.lock_after_day,
            references,
            intro,
        };

        for warning in &mut warnings {
            if !warning.message.starts_with(&file) {
                warning.message = format!("{}: {}", file, warning.message);
            }
        }
        Ok(AssembledDay { record, warnings })
    }
}

fn legacy_closing(raw: &str) -> Option<&str> {
    LEGACY_CLOSING
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = r"\documentclass{article}
\begin{document}
\AdventSheetTwoCol
  {December 7} % date
  {}
  {The \emph{Octonions}}
  {Eight dimensions}
  {Non-associativity matters: $(ab)c \neq a(bc)$.}
  {\AdventInitial{W}{e} begin here.

\section*{Cayley--Dickson}
Doubling the quaternions gives $\mathbb{O}$.

\begin{itemize}
\item First
\item Second
\end{itemize}}
  {See you tomorrow.}
\end{document}
";

    fn assemble(name: &str, source: &str, config: &CalendarConfig) -> AssembledDay {
        Assembler::new(config)
            .assemble(Path::new(name), source)
            .unwrap()
    }

    #[test]
    fn test_full_record() {
        let config = CalendarConfig::default();
        let day = assemble("advent07.tex", SHEET, &config);
        let r = &day.record;
        assert_eq!(r.day, 7);
        assert_eq!(r.date, "2025-12-07");
        assert_eq!(r.date_display, "December 7, 2025");
        assert_eq!(r.title, "The <em>Octonions</em>");
        assert_eq!(r.subtitle, "Eight dimensions");
        assert_eq!(r.key_insight, "Non-associativity matters: $(ab)c \\neq a(bc)$.");
        assert_eq!(r.intro, "<p>We begin here.</p>");
        assert_eq!(
            r.content,
            "<h3>Cayley–Dickson</h3>\n<p>Doubling the quaternions gives $\\mathbb{O}$.</p>\n<ul>\n<li>First</li>\n<li>Second</li>\n</ul>"
        );
        assert_eq!(r.closing, "See you tomorrow.");
        assert_eq!(r.day_type, "Adventssonntag (Doppelblatt)");
        assert_eq!(r.special, "2. Advent – Doppelblatt");
        assert_eq!(r.central_formula, "");
        assert_eq!(r.dependencies, "");
        assert!(!r.is_locked);
        assert!(r.references.is_empty());
        assert!(day.warnings.is_empty());
    }

    #[test]
    fn test_lock_threshold() {
        let config = CalendarConfig::default();
        assert!(!assemble("advent08.tex", SHEET, &config).record.is_locked);
        assert!(assemble("advent09.tex", SHEET, &config).record.is_locked);

        let mut open = CalendarConfig::default();
        open.lock_after_day = 31;
        assert!(!assemble("advent09.tex", SHEET, &open).record.is_locked);
    }

    #[test]
    fn test_no_section_means_no_intro() {
        let src = r"\AdventSheetTwoCol{d}{}{T}{S}{K}{Just text.}{C}";
        let r = assemble("advent02.tex", src, &CalendarConfig::default()).record;
        assert_eq!(r.intro, "");
        assert_eq!(r.content, "<p>Just text.</p>");
    }

    #[test]
    fn test_title_fallbacks() {
        let src = r"\AdventSheetTwoCol{d}{}{ }{S}{K}{\section{From Body} text}{C}";
        let r = assemble("advent02.tex", src, &CalendarConfig::default()).record;
        assert_eq!(r.title, "From Body");

        let src = r"\AdventSheetTwoCol{d}{}{}{S}{K}{no headings}{C}";
        let r = assemble("advent03.tex", src, &CalendarConfig::default()).record;
        assert_eq!(r.title, "Day 3");
    }

    #[test]
    fn test_comment_inside_argument() {
        let src = "\\AdventSheetTwoCol{d}{}{Title % not shown {\n}{S}{K}{Body 50\\% off}{C}";
        let r = assemble("advent04.tex", src, &CalendarConfig::default()).record;
        assert_eq!(r.title, "Title");
        assert_eq!(r.content, "<p>Body 50% off</p>");
    }

    #[test]
    fn test_legacy_schema_closing() {
        let src = "\\AdventSheetTwoCol{d}{}{T}{S}{K}{Body}% end #6\n  Sleep \\emph{well}.\n% #7\n";
        let r = assemble("advent05.tex", src, &CalendarConfig::legacy()).record;
        assert_eq!(r.closing, "Sleep <em>well</em>.");

        let src = "\\AdventSheetTwoCol{d}{}{T}{S}{K}{Body}";
        let r = assemble("advent05.tex", src, &CalendarConfig::legacy()).record;
        assert_eq!(r.closing, "");
    }

    #[test]
    fn test_arity_mismatch_is_extract_error() {
        let src = "\\AdventSheetTwoCol{d}{}{T}{S}{K}{Body}";
        let err = Assembler::new(&CalendarConfig::default())
            .assemble(Path::new("advent05.tex"), src)
            .unwrap_err();
        assert!(err.to_string().contains("expected 7 arguments, found 6"));
        assert!(err.to_string().starts_with("advent05.tex"));
    }

    #[test]
    fn test_skip_and_prologue() {
        let config = CalendarConfig::default();
        let err = Assembler::new(&config)
            .assemble(Path::new("intro.tex"), SHEET)
            .unwrap_err();
        assert!(err.is_skip());

        let r = assemble("advent00.tex", SHEET, &config).record;
        assert_eq!(r.day, 30);
        assert_eq!(r.date, "2025-11-30");
        assert_eq!(r.special, "Prologue");
    }

    #[test]
    fn test_references_from_document() {
        let src = "\\AdventSheetTwoCol{d}{}{T}{S}{K}{Body}{C}\n\\begin{thebibliography}{1}\n\\bibitem{Born1925} M. Born, \\emph{Zur Quantenmechanik}.\n\\end{thebibliography}";
        let r = assemble("advent10.tex", src, &CalendarConfig::default()).record;
        assert_eq!(r.references.len(), 1);
        assert_eq!(r.references[0].key, "Born1925");
        assert_eq!(r.references[0].text, "M. Born, <em>Zur Quantenmechanik</em>.");
    }
}
