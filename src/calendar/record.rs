//! Day records and the output collection
//!
//! The canonical record keeps `special`, `centralFormula` and `dependencies`
//! as strings and `isLocked` as a boolean. Older JSON files used other shapes
//! for those fields; they are migrated while deserializing.

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use super::config::DuplicatePolicy;
use crate::utils::error::{AdventError, AdventResult};

pub use crate::core::bibliography::Reference;

/// One converted advent sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub day: u32,
    pub date: String,
    pub date_display: String,
    pub title: String,
    pub subtitle: String,
    pub key_insight: String,
    pub content: String,
    pub closing: String,
    #[serde(rename = "type")]
    pub day_type: String,
    #[serde(default, deserialize_with = "legacy::string_field")]
    pub special: String,
    #[serde(default, deserialize_with = "legacy::string_field")]
    pub central_formula: String,
    #[serde(default, deserialize_with = "legacy::string_field")]
    pub dependencies: String,
    #[serde(default, deserialize_with = "legacy::bool_field")]
    pub is_locked: bool,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub intro: String,
}

/// Calendar-wide descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub year: i32,
    pub theme: String,
    pub subtitle: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            year: 2025,
            theme: "An Exceptional Algebraic Walk Through Particle Physics".to_string(),
            subtitle: "100 years after Heisenberg's matrix mechanics".to_string(),
            author: "Andreas Müller, Kempten University of Applied Sciences".to_string(),
            email: "andreas.mueller@hs-kempten.de".to_string(),
            description:
                "A journey through octonions, exceptional algebras, and the structure of particle physics"
                    .to_string(),
        }
    }
}

/// Named colors used by the front end, in output order.
pub fn default_color_scheme() -> IndexMap<String, String> {
    [
        ("adventRed", "#B3001B"),
        ("adventBlue", "#003366"),
        ("adventGreen", "#006633"),
        ("adventGold", "#B59410"),
        ("background", "#FEFEFE"),
        ("text", "#1A1A1A"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// The `metadata.json` document of the split output form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFile {
    pub metadata: Metadata,
    pub color_scheme: IndexMap<String, String>,
}

/// Full output corpus: metadata, color scheme and day records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub metadata: Metadata,
    pub color_scheme: IndexMap<String, String>,
    pub days: Vec<DayRecord>,
}

impl Collection {
    pub fn new(metadata: Metadata, color_scheme: IndexMap<String, String>) -> Self {
        Self {
            metadata,
            color_scheme,
            days: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Add a record, resolving a clash on `day` according to `policy`.
    ///
    /// Returns the replaced record under [`DuplicatePolicy::LastWins`].
    pub fn insert(
        &mut self,
        record: DayRecord,
        policy: DuplicatePolicy,
    ) -> AdventResult<Option<DayRecord>> {
        match self.days.iter().position(|r| r.day == record.day) {
            None => {
                self.days.push(record);
                Ok(None)
            }
            Some(_) if policy == DuplicatePolicy::Reject => {
                Err(AdventError::DuplicateDay { day: record.day })
            }
            Some(idx) => {
                warn!("day {} appears more than once, keeping the later file", record.day);
                Ok(Some(std::mem::replace(&mut self.days[idx], record)))
            }
        }
    }

    pub fn sort(&mut self) {
        self.days.sort_by_key(|r| r.day);
    }

    /// Check that day numbers are unique.
    pub fn validate(&self) -> AdventResult<()> {
        let mut seen = fxhash::FxHashSet::default();
        for record in &self.days {
            if !seen.insert(record.day) {
                return Err(AdventError::DuplicateDay { day: record.day });
            }
        }
        Ok(())
    }

    pub fn metadata_file(&self) -> MetadataFile {
        MetadataFile {
            metadata: self.metadata.clone(),
            color_scheme: self.color_scheme.clone(),
        }
    }
}

mod legacy {
    use serde::de::{Deserialize, Deserializer, Error};
    use serde_json::Value;

    pub fn string_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null | Value::Bool(false) => Ok(String::new()),
            Value::Bool(true) => Ok("true".to_string()),
            Value::String(s) => Ok(s),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(D::Error::custom(format!(
                        "expected string list entry, found {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| parts.join(", ")),
            other => Err(D::Error::custom(format!("expected string, found {}", other))),
        }
    }

    pub fn bool_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            other => Err(D::Error::custom(format!("expected boolean, found {}", other))),
        }
    }
}
