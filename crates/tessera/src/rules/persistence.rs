//! Rule document import/export.
//!
//! The document is the only durable format the library produces:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "timestamp": "...",
//!   "rules": [{ "type": "coRun", "tasks": ["T1", "T2"], "active": true }]
//! }
//! ```
//!
//! Rule ids are runtime handles and are stripped on export; import assigns
//! fresh ones.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};

use super::rule::{RuleKind, RuleSet};

/// Current document version.
pub const RULE_DOCUMENT_VERSION: &str = "1.0";

/// A rule as written to disk: kind parameters plus the active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// The exported rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub rules: Vec<RuleEntry>,
}

impl RuleSet {
    /// Export the rules, without ids.
    pub fn to_document(&self) -> RuleDocument {
        RuleDocument {
            version: RULE_DOCUMENT_VERSION.to_string(),
            timestamp: Utc::now(),
            rules: self
                .rules()
                .iter()
                .map(|rule| RuleEntry {
                    kind: rule.kind.clone(),
                    active: rule.active,
                })
                .collect(),
        }
    }

    /// Build a rule set from a document, assigning fresh ids.
    pub fn from_document(document: RuleDocument) -> Self {
        let mut rules = RuleSet::new();
        for entry in document.rules {
            rules.push(entry.kind, entry.active);
        }
        rules
    }

    /// Export as a pretty-printed JSON string.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Import from a JSON string.
    pub fn import_json(json: &str) -> Result<Self> {
        let document: RuleDocument = serde_json::from_str(json)
            .map_err(|e| TesseraError::RuleFormat(format!("Invalid rule document: {}", e)))?;
        Ok(Self::from_document(document))
    }

    /// Save the rule document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    TesseraError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            TesseraError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.to_document()).map_err(|e| {
            TesseraError::Persistence(format!("Failed to serialize rules: {}", e))
        })?;

        Ok(())
    }

    /// Load a rule document from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            TesseraError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        let document: RuleDocument = serde_json::from_reader(reader).map_err(|e| {
            TesseraError::RuleFormat(format!(
                "Failed to parse rule document '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::from_document(document))
    }
}
