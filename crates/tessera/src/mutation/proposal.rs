//! Untrusted fix proposals.
//!
//! Proposals come from outside the engine (an HTTP service, a model, a file)
//! and are plain JSON. Each entry is shape-checked on its own before anything
//! is written: valid entries are applied, invalid ones are skipped and
//! reported, and one bad entry never blocks the rest of the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::TesseraError;
use crate::input::{Entity, Workbook};

use super::edit::FieldEdit;

/// Why one proposal was not applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedProposal {
    /// Position in the proposal list.
    pub index: usize,
    pub reason: String,
}

/// Outcome of applying a batch of proposals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: Vec<FieldEdit>,
    pub skipped: Vec<SkippedProposal>,
}

impl ApplyReport {
    /// Whether any proposal changed the workbook.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Pull the proposal list out of a response body.
///
/// Accepts a bare array, or an object holding the array under `fixes` or
/// `proposals`. Anything else yields no proposals.
pub fn extract_proposals(body: &Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items.clone(),
        Value::Object(map) => ["fixes", "proposals"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Check one proposal's shape against the workbook.
pub fn check_proposal(workbook: &Workbook, proposal: &Value) -> Result<FieldEdit, String> {
    let map = proposal
        .as_object()
        .ok_or_else(|| "proposal is not an object".to_string())?;

    let entity: Entity = map
        .get("entity")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing entity".to_string())?
        .parse()
        .map_err(|e: TesseraError| e.to_string())?;

    let row_index = map
        .get("rowIndex")
        .and_then(Value::as_u64)
        .ok_or_else(|| "rowIndex must be a non-negative integer".to_string())?;
    let row_index = usize::try_from(row_index).map_err(|_| "rowIndex is too large".to_string())?;

    let len = workbook.dataset(entity).len();
    if row_index >= len {
        return Err(format!(
            "rowIndex {} is out of range for {} ({} rows)",
            row_index, entity, len
        ));
    }

    let field = map
        .get("field")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| "field must be a non-empty string".to_string())?;

    let new_value = map
        .get("newValue")
        .cloned()
        .ok_or_else(|| "missing newValue".to_string())?;

    Ok(FieldEdit::new(entity, row_index, field, new_value))
}

/// Apply every well-formed proposal; skip and report the rest.
pub fn apply_proposals(workbook: &mut Workbook, proposals: &[Value]) -> ApplyReport {
    let mut report = ApplyReport::default();

    for (index, proposal) in proposals.iter().enumerate() {
        let outcome = check_proposal(workbook, proposal)
            .and_then(|edit| edit.apply(workbook).map(|_| edit).map_err(|e| e.to_string()));

        match outcome {
            Ok(edit) => report.applied.push(edit),
            Err(reason) => {
                warn!(index, %reason, "Skipping fix proposal");
                report.skipped.push(SkippedProposal { index, reason });
            }
        }
    }

    report
}
