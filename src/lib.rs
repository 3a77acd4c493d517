//! Adventex - advent sheet LaTeX to JSON converter
//!
//! Reads LaTeX sheets built around one fixed macro (`\AdventSheetTwoCol`),
//! transcodes their arguments to HTML and writes day records as JSON for a
//! web front end. Companion utilities split and clean existing output.
//!
//! # Example
//!
//! ```
//! use adventex::latex_to_html;
//!
//! let html = latex_to_html(r"\textbf{Hello} $x^2$");
//! assert_eq!(html, "<p><strong>Hello</strong> $x^2$</p>");
//! ```

pub mod batch;
pub mod calendar;
pub mod cleanup;
pub mod core;
pub mod data;
pub mod utils;

pub use crate::core::bibliography::{extract_references, Reference};
pub use crate::core::latex2html::{
    body_to_html, body_to_html_with, inline_to_html, latex_to_html, BodyMode,
};
pub use crate::core::macro_args::{
    extract_macro_args, strip_comments, SchemaVersion, SheetArgs, SHEET_MACRO,
};

pub use batch::{clean_batch, convert_batch, expand_inputs, split_collection, BatchSummary};
pub use calendar::{
    AssembledDay, Assembler, CalendarConfig, Collection, DayRecord, DuplicatePolicy, Metadata,
    OutputForm,
};
pub use cleanup::clean_html;
pub use utils::error::{
    AdventError, AdventResult, ConversionOutput, ConversionWarning, ExtractError,
};
