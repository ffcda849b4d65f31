//! The fix-suggestion collaborator interface.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, TesseraError};
use crate::input::Workbook;
use crate::validation::Diagnostic;

/// What a provider gets to look at: the data and the open findings.
#[derive(Debug, Clone, Serialize)]
pub struct FixRequest<'a> {
    pub workbook: &'a Workbook,
    pub diagnostics: Vec<&'a Diagnostic>,
}

impl<'a> FixRequest<'a> {
    /// Build a request from the diagnostics not yet marked fixed.
    pub fn new(workbook: &'a Workbook, diagnostics: &'a [Diagnostic]) -> Self {
        Self {
            workbook,
            diagnostics: diagnostics.iter().filter(|d| !d.fixed).collect(),
        }
    }

    /// Whether there is anything to fix.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Source of fix proposals.
///
/// Providers only propose; they never touch the workbook. The returned
/// values are untrusted and go through
/// [`apply_proposals`](super::apply_proposals) before anything is written.
pub trait FixProvider: Send + Sync {
    /// Propose edits as `{entity, rowIndex, field, newValue}` objects.
    fn suggest(&self, request: &FixRequest<'_>) -> Result<Vec<Value>>;

    /// Provider name, for logs and errors.
    fn name(&self) -> &str;
}

/// Parse a provider's text response into a proposal list.
///
/// Tolerates markdown code fences around the JSON.
pub fn parse_fix_response(provider: &str, response: &str) -> Result<Vec<Value>> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(response)
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(response)
    } else {
        response.trim()
    };

    let body: Value = serde_json::from_str(json_str).map_err(|e| TesseraError::FixProvider {
        provider: provider.to_string(),
        message: format!("Failed to parse response JSON: {}", e),
    })?;

    Ok(super::extract_proposals(&body))
}
