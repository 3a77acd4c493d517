//! Calendar configuration
//!
//! Everything the assembler needs that is not in the source documents: the
//! calendar year and month, the lock threshold, the prologue policy, the macro
//! schema and the metadata written next to the day records. Loaded from TOML
//! and overridable from the command line.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::record::{default_color_scheme, Metadata};
use crate::core::latex2html::BodyMode;
use crate::core::macro_args::{SchemaVersion, SHEET_MACRO};
use crate::utils::error::{AdventError, AdventResult};

/// What happens when two files produce the same day number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The file processed later replaces the earlier record
    #[default]
    LastWins,
    /// The later file fails with a duplicate-day error
    Reject,
}

/// Remapping of `advent00` onto a date before the calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prologue {
    /// When false, `advent00` is skipped
    pub enabled: bool,
    /// Day number and day of month the prologue record gets
    pub day: u32,
    pub month: u32,
}

impl Default for Prologue {
    fn default() -> Self {
        Self {
            enabled: true,
            day: 30,
            month: 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarConfig {
    /// Calendar year of every date
    /// Default: 2025
    pub year: i32,

    /// Month of days 1..=31
    /// Default: 12
    pub month: u32,

    /// Records with `day > lock_after_day` are locked
    /// Default: 8
    pub lock_after_day: u32,

    /// Argument layout of the sheet macro
    /// Default: two-col (7 arguments)
    pub schema: SchemaVersion,

    pub macro_name: String,

    pub body_mode: BodyMode,

    pub duplicate_policy: DuplicatePolicy,

    pub prologue: Prologue,

    pub metadata: Metadata,

    pub color_scheme: IndexMap<String, String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            year: 2025,
            month: 12,
            lock_after_day: 8,
            schema: SchemaVersion::TwoCol,
            macro_name: SHEET_MACRO.to_string(),
            body_mode: BodyMode::Structured,
            duplicate_policy: DuplicatePolicy::LastWins,
            prologue: Prologue::default(),
            metadata: Metadata::default(),
            color_scheme: default_color_scheme(),
        }
    }
}

impl CalendarConfig {
    /// Settings for sheets written against the six-argument macro.
    pub fn legacy() -> Self {
        Self {
            schema: SchemaVersion::Legacy,
            ..Self::default()
        }
    }

    /// Set the calendar year, keeping the metadata year in step.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self.metadata.year = year;
        self
    }

    pub fn from_toml_str(text: &str) -> AdventResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| AdventError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> AdventResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| AdventError::io(path, &e))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            AdventError::Config { message } => {
                AdventError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn to_toml_string(&self) -> AdventResult<String> {
        toml::to_string_pretty(self).map_err(|e| AdventError::config(e.to_string()))
    }

    pub fn validate(&self) -> AdventResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(AdventError::config(format!(
                "month must be within 1..=12, got {}",
                self.month
            )));
        }
        if self.macro_name.is_empty() || !self.macro_name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AdventError::config(format!(
                "macro name '{}' must be a non-empty run of ASCII letters",
                self.macro_name
            )));
        }
        if self.prologue.enabled {
            if !(1..=12).contains(&self.prologue.month) {
                return Err(AdventError::config(format!(
                    "prologue month must be within 1..=12, got {}",
                    self.prologue.month
                )));
            }
            if self.prologue.day == 0 {
                return Err(AdventError::config("prologue day must be positive"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CalendarConfig::default();
        assert_eq!(config.year, 2025);
        assert_eq!(config.month, 12);
        assert_eq!(config.lock_after_day, 8);
        assert_eq!(config.schema.arity(), 7);
        assert_eq!(config.prologue, Prologue { enabled: true, day: 30, month: 11 });
        assert_eq!(config.color_scheme.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_preset() {
        let config = CalendarConfig::legacy();
        assert_eq!(config.schema, SchemaVersion::Legacy);
        assert_eq!(config.schema.arity(), 6);
    }

    #[test]
    fn test_partial_toml() {
        let config = CalendarConfig::from_toml_str(
            r#"
year = 2026
lockAfterDay = 24
schema = "legacy"
duplicatePolicy = "reject"

[prologue]
enabled = false

[metadata]
theme = "Another walk"
"#,
        )
        .unwrap();
        assert_eq!(config.year, 2026);
        assert_eq!(config.lock_after_day, 24);
        assert_eq!(config.schema, SchemaVersion::Legacy);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!config.prologue.enabled);
        assert_eq!(config.metadata.theme, "Another walk");
        assert_eq!(config.metadata.email, "andreas.mueller@hs-kempten.de");
        assert_eq!(config.month, 12);
    }

    #[test]
    fn test_color_scheme_keeps_file_order() {
        let config = CalendarConfig::from_toml_str(
            "[colorScheme]\nzeta = \"#000000\"\nalpha = \"#FFFFFF\"\n",
        )
        .unwrap();
        let keys: Vec<&str> = config.color_scheme.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = CalendarConfig::from_toml_str("month = 13").unwrap_err();
        assert!(matches!(err, AdventError::Config { .. }));

        let err = CalendarConfig::from_toml_str("macroName = \"Advent Sheet\"").unwrap_err();
        assert!(err.to_string().contains("macro name"));

        let err = CalendarConfig::from_toml_str("year = \"soon\"").unwrap_err();
        assert!(matches!(err, AdventError::Config { .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CalendarConfig::default().with_year(2030);
        let text = config.to_toml_string().unwrap();
        let back = CalendarConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.metadata.year, 2030);
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        let config =
            CalendarConfig::from_toml_str("bodyMode = \"flat\"\nschema = \"two-col\"").unwrap();
        assert_eq!(config.body_mode, BodyMode::Flat);
        assert_eq!(config.schema, SchemaVersion::TwoCol);

        assert!(CalendarConfig::from_toml_str("duplicatePolicy = \"first-wins\"").is_err());
        assert!(CalendarConfig::from_toml_str("bodyMode = \"fancy\"").is_err());
        assert!(CalendarConfig::from_toml_str("schema = \"eight\"").is_err());
    }
}
