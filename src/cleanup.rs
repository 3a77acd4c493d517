//! HTML cleanup for already-written day files
//!
//! Repairs leftovers of older conversions: comment rulers, paragraphs wrapped
//! around block tags, doubled closing tags, reference keys left on their own
//! line and unconverted TeX quotes. Cleaning is idempotent.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::calendar::output::{read_day, write_day};
use crate::calendar::record::DayRecord;
use crate::utils::error::AdventResult;

/// Default directory holding `dayNN.json` files.
pub const DEFAULT_DAYS_DIR: &str = "public/data/days";

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).unwrap(),
        replacement,
    }
}

lazy_static! {
    static ref RULES: Vec<Rule> = vec![
        // %--- ruler pairs, then stray rulers
        rule(r"%-+.*?%-+", ""),
        rule(r"%-+", ""),
        rule(r"<p>\s*<h(\d)>", "<h${1}>"),
        rule(r"</h(\d)>\s*</p>", "</h${1}>"),
        rule(r"<p>\s*<(ul|ol|dl|dt|dd|li|blockquote)>", "<${1}>"),
        rule(r"</(ul|ol|dl|dt|dd|li|blockquote)>\s*</p>", "</${1}>"),
        rule(r"</p>(\s*</p>)+", "</p>"),
        rule(r"(?m)^([A-Z][a-z]+\d{4})\n", "<p><strong>${1}</strong><br>\n"),
        rule(r"``(.*?)''", "\"${1}\""),
        rule(r"\s*thebibliography\s*", ""),
        rule(r"\n{3,}", "\n\n"),
    ];
}

/// Apply every cleanup rule in order and trim the result.
pub fn clean_html(html: &str) -> String {
    let mut text = html.to_string();
    for rule in RULES.iter() {
        text = rule
            .pattern
            .replace_all(&text, rule.replacement)
            .into_owned();
    }
    text.trim().to_string()
}

/// Clean `content` and `intro`, trim `closing`. Returns whether anything changed.
pub fn clean_record(record: &mut DayRecord) -> bool {
    let content = clean_html(&record.content);
    let intro = clean_html(&record.intro);
    let closing = record.closing.trim().to_string();
    let changed = content != record.content || intro != record.intro || closing != record.closing;
    record.content = content;
    record.intro = intro;
    record.closing = closing;
    changed
}

/// Clean one day file in place.
///
/// The file is rewritten in canonical form even when no HTML changed, so
/// legacy field shapes are migrated on disk too.
pub fn clean_day_file(path: &Path) -> AdventResult<bool> {
    let mut record = read_day(path)?;
    let changed = clean_record(&mut record);
    write_day(path, &record)?;
    Ok(changed)
}
