//! Scalar parsers for loosely formatted cells.
//!
//! Every parser is pure and returns a value or a [`ParseError`]; none of them
//! panic on any input.

mod phases;
mod scalar;

use thiserror::Error;

pub use phases::parse_phases;
pub use scalar::{format_list, format_number, in_range, parse_list, parse_object, to_number};

/// Failure to parse a single cell.
///
/// The display strings are what end up in diagnostic messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed JSON array")]
    MalformedArray,
    #[error("invalid array format")]
    InvalidArrayFormat,
    #[error("must be a valid JSON object")]
    InvalidObject,
    #[error("invalid range format")]
    InvalidRange,
    #[error("non-numeric value '{0}'")]
    NonNumeric(String),
}
