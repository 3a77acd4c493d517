//! Day numbers, dates and day classification

use std::path::Path;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use lazy_static::lazy_static;
use regex::Regex;

use super::config::CalendarConfig;
use crate::utils::error::{AdventError, AdventResult};

lazy_static! {
    static ref DAY_PATTERN: Regex = Regex::new(r"advent(\d+)").unwrap();
}

/// Resolved calendar position of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayDate {
    /// Day number used as the record key
    pub day: u32,
    pub date: NaiveDate,
    pub prologue: bool,
}

impl DayDate {
    /// `YYYY-MM-DD`
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `December 7, 2025`
    pub fn display(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    pub fn kind(&self) -> DayKind {
        DayKind::classify(self.date, self.prologue)
    }
}

/// Day number embedded in a file name (`advent07.tex` -> 7).
///
/// Numbers too large for `u32` saturate so they surface as invalid days.
pub fn day_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let digits = DAY_PATTERN.captures(stem)?.get(1)?.as_str();
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Map a file name onto its day number and date.
pub fn resolve_day(path: &Path, config: &CalendarConfig) -> AdventResult<DayDate> {
    let skip = || AdventError::FilenamePattern {
        file: path.display().to_string(),
    };
    let number = day_number(path).ok_or_else(skip)?;

    if number == 0 {
        if !config.prologue.enabled {
            return Err(skip());
        }
        let (day, month) = (config.prologue.day, config.prologue.month);
        let date =
            NaiveDate::from_ymd_opt(config.year, month, day).ok_or(AdventError::InvalidDay {
                day,
                year: config.year,
                month,
            })?;
        return Ok(DayDate {
            day,
            date,
            prologue: true,
        });
    }

    let date = NaiveDate::from_ymd_opt(config.year, config.month, number).ok_or(
        AdventError::InvalidDay {
            day: number,
            year: config.year,
            month: config.month,
        },
    )?;
    Ok(DayDate {
        day: number,
        date,
        prologue: false,
    })
}

/// Calendar role of a date within the advent season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Prologue,
    /// One of the four Sundays before Christmas, numbered 1..=4
    AdventSunday(u8),
    Nikolaus,
    ChristmasEve,
    Christmas,
    NewYearsEve,
    Weekday,
}

impl DayKind {
    pub fn classify(date: NaiveDate, prologue: bool) -> Self {
        if prologue {
            return DayKind::Prologue;
        }
        if let Some(n) = advent_sunday(date) {
            return DayKind::AdventSunday(n);
        }
        match (date.month(), date.day()) {
            (12, 6) => DayKind::Nikolaus,
            (12, 24) => DayKind::ChristmasEve,
            (12, 25) => DayKind::Christmas,
            (12, 31) => DayKind::NewYearsEve,
            _ => DayKind::Weekday,
        }
    }

    /// Value of the record's `type` field.
    pub fn type_label(&self, date: NaiveDate) -> String {
        match self {
            DayKind::Prologue => format!("Vorwoche ({})", date.format("%B %-d")),
            DayKind::AdventSunday(_) => "Adventssonntag (Doppelblatt)".to_string(),
            DayKind::Nikolaus => "Werktag/Nikolaus".to_string(),
            DayKind::ChristmasEve => "Heiligabend".to_string(),
            DayKind::Christmas => "Weihnachten".to_string(),
            DayKind::NewYearsEve => "Silvester".to_string(),
            DayKind::Weekday => "Werktag".to_string(),
        }
    }

    /// Value of the record's `special` field.
    pub fn special_label(&self) -> String {
        match self {
            DayKind::Prologue => "Prologue".to_string(),
            DayKind::AdventSunday(n) => format!("{}. Advent – Doppelblatt", n),
            DayKind::Nikolaus => "Nikolaus".to_string(),
            DayKind::ChristmasEve => "Christmas Eve".to_string(),
            DayKind::Christmas => "Christmas".to_string(),
            DayKind::NewYearsEve => "New Year's Eve".to_string(),
            DayKind::Weekday => String::new(),
        }
    }
}

/// Advent Sunday number of `date`, if it is one.
///
/// The fourth Advent is the last Sunday on or before December 24.
pub fn advent_sunday(date: NaiveDate) -> Option<u8> {
    if date.weekday() != Weekday::Sun {
        return None;
    }
    let eve = NaiveDate::from_ymd_opt(date.year(), 12, 24)?;
    let back = eve.weekday().num_days_from_sunday() as u64;
    let fourth = eve - Days::new(back);
    let weeks_before = (fourth - date).num_days() / 7;
    match weeks_before {
        0..=3 => Some((4 - weeks_before) as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_number_from_file_name() {
        assert_eq!(day_number(Path::new("advent07.tex")), Some(7));
        assert_eq!(day_number(Path::new("dir/advent7.tex")), Some(7));
        assert_eq!(day_number(Path::new("old_advent24_v2.tex")), Some(24));
        assert_eq!(day_number(Path::new("Advent07.tex")), None);
        assert_eq!(day_number(Path::new("notes.tex")), None);
    }

    #[test]
    fn test_resolve_regular_day() {
        let config = CalendarConfig::default();
        let d = resolve_day(Path::new("advent07.tex"), &config).unwrap();
        assert_eq!(d.day, 7);
        assert_eq!(d.iso(), "2025-12-07");
        assert_eq!(d.display(), "December 7, 2025");
    }

    #[test]
    fn test_resolve_prologue() {
        let config = CalendarConfig::default();
        let d = resolve_day(Path::new("advent00.tex"), &config).unwrap();
        assert_eq!(d.day, 30);
        assert_eq!(d.iso(), "2025-11-30");
        assert_eq!(d.display(), "November 30, 2025");
        assert_eq!(d.kind(), DayKind::Prologue);
        assert_eq!(d.kind().type_label(d.date), "Vorwoche (November 30)");

        let mut config = CalendarConfig::default();
        config.prologue.enabled = false;
        let err = resolve_day(Path::new("advent00.tex"), &config).unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_invalid_days() {
        let config = CalendarConfig::default();
        let err = resolve_day(Path::new("advent32.tex"), &config).unwrap_err();
        assert!(matches!(err, AdventError::InvalidDay { day: 32, .. }));

        let err = resolve_day(Path::new("advent99999999999.tex"), &config).unwrap_err();
        assert!(!err.is_skip());
        assert!(matches!(err, AdventError::InvalidDay { day: u32::MAX, .. }));

        let mut november = CalendarConfig::default();
        november.month = 11;
        assert!(resolve_day(Path::new("advent31.tex"), &november).is_err());
        assert!(resolve_day(Path::new("readme.tex"), &november)
            .unwrap_err()
            .is_skip());
    }

    #[test]
    fn test_advent_sundays_2025() {
        assert_eq!(advent_sunday(ymd(2025, 11, 30)), Some(1));
        assert_eq!(advent_sunday(ymd(2025, 12, 7)), Some(2));
        assert_eq!(advent_sunday(ymd(2025, 12, 14)), Some(3));
        assert_eq!(advent_sunday(ymd(2025, 12, 21)), Some(4));
        assert_eq!(advent_sunday(ymd(2025, 12, 28)), None);
        assert_eq!(advent_sunday(ymd(2025, 11, 23)), None);
        assert_eq!(advent_sunday(ymd(2025, 12, 8)), None);
    }

    #[test]
    fn test_fourth_advent_on_christmas_eve() {
        // 2023: December 24 is a Sunday
        assert_eq!(advent_sunday(ymd(2023, 12, 24)), Some(4));
        assert_eq!(advent_sunday(ymd(2023, 12, 3)), Some(1));
    }

    #[test]
    fn test_classification_labels() {
        let kind = DayKind::classify(ymd(2025, 12, 7), false);
        assert_eq!(kind, DayKind::AdventSunday(2));
        assert_eq!(kind.type_label(ymd(2025, 12, 7)), "Adventssonntag (Doppelblatt)");
        assert_eq!(kind.special_label(), "2. Advent – Doppelblatt");

        assert_eq!(DayKind::classify(ymd(2025, 12, 6), false).special_label(), "Nikolaus");
        assert_eq!(DayKind::classify(ymd(2025, 12, 24), false), DayKind::ChristmasEve);
        assert_eq!(DayKind::classify(ymd(2025, 12, 25), false), DayKind::Christmas);
        assert_eq!(DayKind::classify(ymd(2025, 12, 31), false), DayKind::NewYearsEve);

        let plain = DayKind::classify(ymd(2025, 12, 9), false);
        assert_eq!(plain.type_label(ymd(2025, 12, 9)), "Werktag");
        assert_eq!(plain.special_label(), "");
    }
}
