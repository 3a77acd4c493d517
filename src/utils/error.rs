//! Error handling for Adventex conversions
//!
//! This module provides the error kinds raised while extracting, assembling
//! and writing day records, plus the non-fatal warning and output types that
//! carry diagnostics alongside converted content.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Failure while pulling brace-delimited arguments out of a macro invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The macro name does not occur in the document
    #[error("macro \\{name} not found")]
    NotFound { name: String },

    /// Something other than `{` where argument `index` should start
    #[error("argument {index}: expected '{{', found {}", describe_found(.found))]
    MalformedArgument { index: usize, found: Option<char> },

    /// Argument `index` opened but its braces never balance
    #[error("argument {index}: unterminated brace group")]
    UnterminatedArgument { index: usize },

    /// Input ended before all expected groups were read
    #[error("expected {expected} arguments, found {found}")]
    ArityMismatch { expected: usize, found: usize },
}

fn describe_found(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("'{}'", c.escape_default()),
        None => "end of input".to_string(),
    }
}

/// Crate-level error type.
#[derive(Debug, Clone, Error)]
pub enum AdventError {
    /// Macro extraction failed for one document
    #[error("{file}: {source}")]
    Extract {
        file: String,
        #[source]
        source: ExtractError,
    },

    /// File name does not carry a day number; the file is skipped
    #[error("{file}: file name does not match advent<NN>, skipped")]
    FilenamePattern { file: String },

    /// Day number has no calendar date under the active configuration
    #[error("day {day} has no valid date in {year}-{month:02}")]
    InvalidDay { day: u32, year: i32, month: u32 },

    /// Second record for an already collected day under the reject policy
    #[error("day {day} already present in the collection")]
    DuplicateDay { day: u32 },

    /// Read or write failure
    #[error("IO error: {path}: {message}")]
    Io { path: String, message: String },

    /// JSON (de)serialization failure
    #[error("JSON error: {path}: {message}")]
    Json { path: String, message: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Batch found nothing to process
    #[error("no input files found")]
    NoInput,
}

/// Result type for Adventex operations
pub type AdventResult<T> = Result<T, AdventError>;

// Convenience constructors for errors
impl AdventError {
    pub fn extract(file: impl Into<String>, source: ExtractError) -> Self {
        AdventError::Extract {
            file: file.into(),
            source,
        }
    }

    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        AdventError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn json(path: &Path, err: &serde_json::Error) -> Self {
        AdventError::Json {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AdventError::Config {
            message: message.into(),
        }
    }

    /// Skips are reported but never counted as failures.
    pub fn is_skip(&self) -> bool {
        matches!(self, AdventError::FilenamePattern { .. })
    }
}

/// A non-fatal issue met while converting one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWarning {
    pub message: String,
}

impl ConversionWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {}", self.message)
    }
}

/// Conversion output with optional warnings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOutput {
    /// The converted content
    pub content: String,
    /// Any warnings generated during conversion
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionOutput {
    pub fn new(content: String) -> Self {
        Self {
            content,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(content: String, warnings: Vec<ConversionWarning>) -> Self {
        Self { content, warnings }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
