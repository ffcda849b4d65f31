//! Error types for the Tessera library.
//!
//! These cover operational failures only (I/O, malformed files, bad
//! mutations). Data-quality findings are never errors; they are reported as
//! [`Diagnostic`](crate::validation::Diagnostic) values.

use std::path::PathBuf;
use thiserror::Error;

use crate::input::Entity;

/// Main error type for Tessera operations.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Unknown entity name.
    #[error("Unknown entity '{0}' (expected clients, workers or tasks)")]
    UnknownEntity(String),

    /// A mutation addressed a row that does not exist.
    #[error("Row {row_index} is out of range for {entity} ({len} rows)")]
    RowOutOfRange {
        entity: Entity,
        row_index: usize,
        len: usize,
    },

    /// Malformed rule document.
    #[error("Rule document error: {0}")]
    RuleFormat(String),

    /// The fix-suggestion collaborator failed.
    #[error("Fix provider '{provider}' failed: {message}")]
    FixProvider { provider: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure saving or loading a file.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Tessera operations.
pub type Result<T> = std::result::Result<T, TesseraError>;
