//! JSON output: single collection file, bare day list, or split directory.
//!
//! All JSON is pretty-printed with two-space indentation and written as raw
//! UTF-8.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::record::{Collection, DayRecord};
use crate::utils::error::{AdventError, AdventResult};

/// Default location of the single-file collection.
pub const DEFAULT_COLLECTION_PATH: &str = "public/advent_data.json";
/// Default directory of the split form.
pub const DEFAULT_SPLIT_DIR: &str = "public/data";

pub const METADATA_FILE: &str = "metadata.json";
pub const DAYS_DIR: &str = "days";

/// Where and how a collection is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputForm {
    /// `{ metadata, colorScheme, days }` in one file
    Single(PathBuf),
    /// Only the `days` array
    DaysOnly(PathBuf),
    /// `metadata.json` plus `days/dayNN.json` under a directory
    Split(PathBuf),
}

/// `day07.json`
pub fn day_file_name(day: u32) -> String {
    format!("day{:02}.json", day)
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AdventResult<()> {
    let text = to_json_pretty(value).map_err(|e| AdventError::json(path, &e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AdventError::io(parent, &e))?;
    }
    fs::write(path, text).map_err(|e| AdventError::io(path, &e))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> AdventResult<T> {
    let text = fs::read_to_string(path).map_err(|e| AdventError::io(path, &e))?;
    serde_json::from_str(&text).map_err(|e| AdventError::json(path, &e))
}

/// Read a collection file; day numbers must be unique.
pub fn read_collection(path: &Path) -> AdventResult<Collection> {
    let collection: Collection = read_json(path)?;
    collection.validate()?;
    Ok(collection)
}

pub fn read_day(path: &Path) -> AdventResult<DayRecord> {
    read_json(path)
}

pub fn write_day(path: &Path, record: &DayRecord) -> AdventResult<()> {
    write_json(path, record)
}

/// Write the split form; returns every file written, metadata first.
pub fn write_split(dir: &Path, collection: &Collection) -> AdventResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(collection.len() + 1);

    let metadata_path = dir.join(METADATA_FILE);
    write_json(&metadata_path, &collection.metadata_file())?;
    written.push(metadata_path);

    let days_dir = dir.join(DAYS_DIR);
    fs::create_dir_all(&days_dir).map_err(|e| AdventError::io(&days_dir, &e))?;
    for record in &collection.days {
        let path = days_dir.join(day_file_name(record.day));
        write_day(&path, record)?;
        written.push(path);
    }
    Ok(written)
}

/// Write `collection` in the requested form; returns the files written.
pub fn write_output(form: &OutputForm, collection: &Collection) -> AdventResult<Vec<PathBuf>> {
    match form {
        OutputForm::Single(path) => {
            write_json(path, collection)?;
            Ok(vec![path.clone()])
        }
        OutputForm::DaysOnly(path) => {
            write_json(path, &collection.days)?;
            Ok(vec![path.clone()])
        }
        OutputForm::Split(dir) => write_split(dir, collection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::config::DuplicatePolicy;
    use crate::calendar::record::{default_color_scheme, Metadata, MetadataFile};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(day: u32) -> DayRecord {
        DayRecord {
            day,
            date: format!("2025-12-{:02}", day),
            date_display: format!("December {}, 2025", day),
            title: format!("Tag {} – Müller", day),
            subtitle: String::new(),
            key_insight: String::new(),
            content: "<p>x</p>".to_string(),
            closing: String::new(),
            day_type: "Werktag".to_string(),
            special: String::new(),
            central_formula: String::new(),
            dependencies: String::new(),
            is_locked: day > 8,
            references: Vec::new(),
            intro: String::new(),
        }
    }

    fn collection() -> Collection {
        let mut c = Collection::new(Metadata::default(), default_color_scheme());
        for day in [3, 12] {
            c.insert(record(day), DuplicatePolicy::Reject).unwrap();
        }
        c
    }

    #[test]
    fn test_pretty_json_is_raw_utf8() {
        let text = to_json_pretty(&record(1)).unwrap();
        assert!(text.contains("Müller"));
        assert!(text.contains("\n  \"day\": 1,"));
    }

    #[test]
    fn test_single_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("public/advent_data.json");
        let original = collection();
        write_output(&OutputForm::Single(path.clone()), &original).unwrap();
        let back = read_collection(&path).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_days_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("days.json");
        write_output(&OutputForm::DaysOnly(path.clone()), &collection()).unwrap();
        let days: Vec<DayRecord> = read_json(&path).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].day, 12);
    }

    #[test]
    fn test_split_layout() {
        let dir = TempDir::new().unwrap();
        let written = write_split(dir.path(), &collection()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("days/day03.json").is_file());
        assert!(dir.path().join("days/day12.json").is_file());

        let meta: MetadataFile = read_json(&dir.path().join(METADATA_FILE)).unwrap();
        assert_eq!(meta.metadata.year, 2025);
        assert_eq!(meta.color_scheme.len(), 6);

        let day = read_day(&dir.path().join("days/day12.json")).unwrap();
        assert!(day.is_locked);
    }

    #[test]
    fn test_read_rejects_duplicate_days() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("advent_data.json");
        let mut dup = collection();
        dup.days.push(record(3));
        write_json(&path, &dup).unwrap();
        assert!(matches!(
            read_collection(&path),
            Err(AdventError::DuplicateDay { day: 3 })
        ));
    }

    #[test]
    fn test_read_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(read_collection(&missing), Err(AdventError::Io { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(read_day(&broken), Err(AdventError::Json { .. })));
    }
}
