//! Core conversion engine
//!
//! - `macro_args`: locate the sheet macro and pull its arguments
//! - `latex2html`: transcode argument text to HTML fragments
//! - `bibliography`: collect reference entries

pub mod bibliography;
pub mod latex2html;
pub mod macro_args;
