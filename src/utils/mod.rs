//! Utility modules
//!
//! - Error and warning types shared by every layer
//! - Logger bootstrap for the command line

pub mod error;
pub mod logging;

pub use error::{
    AdventError, AdventResult, ConversionOutput, ConversionWarning, ExtractError,
};
