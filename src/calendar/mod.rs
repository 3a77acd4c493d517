//! Calendar layer: configuration, dates, records and output
//!
//! Turns transcoded sheet arguments into day records keyed by day number and
//! writes them as JSON for the front end.

pub mod assemble;
pub mod config;
pub mod dates;
pub mod output;
pub mod record;

pub use assemble::{AssembledDay, Assembler};
pub use config::{CalendarConfig, DuplicatePolicy, Prologue};
pub use dates::{resolve_day, DayDate, DayKind};
pub use output::{write_output, OutputForm};
pub use record::{Collection, DayRecord, Metadata, MetadataFile, Reference};
