//! Batch driver
//!
//! Expands input patterns, runs the assembler over every file in sorted order
//! and reports one progress line per file. A failing file never stops the
//! batch; only finding no input at all is fatal.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use regex::Regex;

use crate::calendar::output::{read_collection, write_split};
use crate::calendar::{Assembler, CalendarConfig, Collection};
use crate::cleanup::clean_day_file;
use crate::utils::error::{AdventError, AdventResult};

/// Pattern used when `convert` gets no inputs.
pub const DEFAULT_SOURCE_PATTERN: &str = "advent*.tex";
/// Pattern used for directories given to `clean`.
pub const DEFAULT_DAY_PATTERN: &str = "day*.json";

/// Per-run counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch conversion complete: {} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}

fn progress_error(err: io::Error) -> AdventError {
    AdventError::Io {
        path: "<progress>".to_string(),
        message: err.to_string(),
    }
}

/// Translate a shell-style file name pattern (`*`, `?`) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> AdventResult<Regex> {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
        .map_err(|e| AdventError::config(format!("invalid pattern '{}': {}", pattern, e)))
}

fn has_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

/// Files in `dir` whose names match `name_pattern`.
fn match_in_dir(dir: &Path, name_pattern: &str) -> AdventResult<Vec<PathBuf>> {
    let matcher = glob_to_regex(name_pattern)?;
    let entries = fs::read_dir(dir).map_err(|e| AdventError::io(dir, &e))?;
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| matcher.is_match(n))
            .unwrap_or(false);
        if matches && path.is_file() {
            found.push(path);
        }
    }
    Ok(found)
}

/// Expand input patterns into a sorted, de-duplicated file list.
///
/// Each pattern is a directory (all files matching `dir_pattern` inside it),
/// a file name pattern whose last component may hold `*`/`?`, or a plain
/// path. With no patterns, `dir_pattern` is matched in the current directory.
pub fn expand_inputs(patterns: &[String], dir_pattern: &str) -> AdventResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    if patterns.is_empty() {
        files.extend(match_in_dir(Path::new("."), dir_pattern)?);
    }

    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_dir() {
            files.extend(match_in_dir(path, dir_pattern)?);
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if has_wildcard(name) {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            if parent.is_dir() {
                files.extend(match_in_dir(parent, name)?);
            } else {
                warn!("{}: directory not found", parent.display());
            }
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            warn!("{}: no such file", pattern);
        }
    }

    files.sort();
    files.dedup();
    if files.is_empty() {
        return Err(AdventError::NoInput);
    }
    debug!("{} input file(s)", files.len());
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.strip_prefix(".").unwrap_or(path).display().to_string()
}

/// Convert `files` in order into one sorted collection.
pub fn convert_batch<W: Write>(
    files: &[PathBuf],
    config: &CalendarConfig,
    out: &mut W,
) -> AdventResult<(Collection, BatchSummary)> {
    let assembler = Assembler::new(config);
    let mut collection = Collection::new(config.metadata.clone(), config.color_scheme.clone());
    let mut summary = BatchSummary::default();

    for path in files {
        let name = display_name(path);
        write!(out, "→ {}... ", name).map_err(progress_error)?;

        let outcome = assembler.assemble_file(path).and_then(|assembled| {
            let day = assembled.record.day;
            collection
                .insert(assembled.record, config.duplicate_policy)
                .map(|replaced| (day, assembled.warnings, replaced.is_some()))
        });

        match outcome {
            Ok((day, warnings, replaced)) => {
                summary.succeeded += 1;
                let mut line = format!("✓ Day {}", day);
                if !warnings.is_empty() {
                    line.push_str(&format!(" ({} warning(s))", warnings.len()));
                }
                if replaced {
                    line.push_str(" (replaces earlier record)");
                }
                writeln!(out, "{}", line).map_err(progress_error)?;
                for warning in &warnings {
                    writeln!(out, "    {}", warning).map_err(progress_error)?;
                }
            }
            Err(e) if e.is_skip() => {
                summary.skipped += 1;
                debug!("{}", e);
                writeln!(out, "⚠ skipped").map_err(progress_error)?;
            }
            Err(e) => {
                summary.failed += 1;
                warn!("{}", e);
                writeln!(out, "✗ {}", e).map_err(progress_error)?;
            }
        }
    }

    collection.sort();
    Ok((collection, summary))
}

/// Clean every day file in place.
pub fn clean_batch<W: Write>(files: &[PathBuf], out: &mut W) -> AdventResult<BatchSummary> {
    let mut summary = BatchSummary::default();
    for path in files {
        let name = display_name(path);
        match clean_day_file(path) {
            Ok(changed) => {
                summary.succeeded += 1;
                let note = if changed { "" } else { " (unchanged)" };
                writeln!(out, "✓ Cleaned {}{}", name, note).map_err(progress_error)?;
            }
            Err(e) => {
                summary.failed += 1;
                warn!("{}", e);
                writeln!(out, "✗ Error cleaning {}: {}", name, e).map_err(progress_error)?;
            }
        }
    }
    Ok(summary)
}

/// Split a collection file into `metadata.json` and per-day files.
pub fn split_collection<W: Write>(input: &Path, dir: &Path, out: &mut W) -> AdventResult<usize> {
    let collection = read_collection(input)?;
    let written = write_split(dir, &collection)?;
    for path in &written {
        writeln!(out, "✓ Created {}", path.display()).map_err(progress_error)?;
    }
    Ok(collection.len())
}
