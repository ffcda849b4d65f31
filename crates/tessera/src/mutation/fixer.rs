//! Local provider for mechanically fixable findings.

use serde_json::{Value, json};

use crate::config::EngineConfig;
use crate::error::{Result, TesseraError};
use crate::input::{Record, Workbook};
use crate::parse::{parse_list, to_number};
use crate::schema::canonical;
use crate::validation::{Diagnostic, DiagnosticCode};

use super::edit::FieldEdit;
use super::provider::{FixProvider, FixRequest};

/// Proposes edits that need no judgement:
///
/// - an out-of-range numeric priority is clamped into the configured bounds
/// - a duration below the minimum is raised to it
/// - a `maxLoadPerPhase` above the slot count is lowered to it
///
/// Non-numeric values are left alone; there is no safe guess for them.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedFixer {
    config: EngineConfig,
}

impl RuleBasedFixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    fn propose(&self, workbook: &Workbook, diag: &Diagnostic) -> Option<FieldEdit> {
        let row_index = diag.row_index?;
        let row = workbook.dataset(diag.entity).row(row_index)?;

        let new_value = match diag.code {
            DiagnosticCode::OutOfRange
                if diag.field == canonical::CLIENT_PRIORITY.name()
                    || diag.field == canonical::TASK_PRIORITY.name() =>
            {
                let current = to_number(row_value(row, &diag.field)?);
                if current.is_nan() {
                    return None;
                }
                number(
                    current
                        .round()
                        .clamp(self.config.priority_min, self.config.priority_max),
                )
            }
            DiagnosticCode::OutOfRange if diag.field == canonical::DURATION.name() => {
                let current = to_number(row_value(row, &diag.field)?);
                if current.is_nan() {
                    return None;
                }
                number(self.config.min_duration)
            }
            DiagnosticCode::ExceedsSlots => {
                let slots = parse_list(canonical::AVAILABLE_SLOTS.get(row)?).ok()?;
                json!(slots.len())
            }
            _ => return None,
        };

        Some(FieldEdit::new(diag.entity, row_index, diag.field.clone(), new_value))
    }
}

/// Read a diagnostic's field back from its row, through the alias table.
fn row_value<'a>(row: &'a Record, field: &str) -> Option<&'a Value> {
    [
        canonical::CLIENT_PRIORITY,
        canonical::TASK_PRIORITY,
        canonical::DURATION,
    ]
    .into_iter()
    .find(|f| f.name() == field)
    .and_then(|f| f.get(row))
}

fn number(value: f64) -> Value {
    if value.fract() == 0.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

impl FixProvider for RuleBasedFixer {
    fn suggest(&self, request: &FixRequest<'_>) -> Result<Vec<Value>> {
        request
            .diagnostics
            .iter()
            .filter_map(|diag| self.propose(request.workbook, diag))
            .map(|edit| serde_json::to_value(edit).map_err(TesseraError::from))
            .collect()
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}
