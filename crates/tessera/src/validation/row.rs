//! Per-row field rules for each entity.

use std::collections::HashSet;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::input::{Entity, Record, Workbook};
use crate::parse::{self, ParseError, format_number, in_range, to_number};
use crate::schema::fields::{cell_to_string, is_truthy};
use crate::schema::{Field, canonical, normalize, row_id};

use super::diagnostic::{Diagnostic, DiagnosticCode};

/// What the task checks need to know about one worker.
#[derive(Debug, Clone)]
struct WorkerProfile {
    skills: HashSet<String>,
    has_slots: bool,
}

/// Validates single rows against the per-entity field rules.
///
/// Cross-entity lookups (task ids, worker skills) are indexed once when the
/// validator is built, so a pass stays linear in the number of rows.
pub struct RowValidator<'a> {
    config: &'a EngineConfig,
    task_ids: HashSet<String>,
    workers: Vec<WorkerProfile>,
}

impl<'a> RowValidator<'a> {
    /// Index the workbook for cross-references.
    pub fn new(workbook: &Workbook, config: &'a EngineConfig) -> Self {
        let task_ids = workbook
            .tasks
            .rows
            .iter()
            .filter_map(|row| row_id(Entity::Tasks, row))
            .collect();

        let workers = workbook
            .workers
            .rows
            .iter()
            .map(|row| WorkerProfile {
                skills: list_field(row, canonical::WORKER_SKILLS)
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
                has_slots: has_items(canonical::AVAILABLE_SLOTS.get(row)),
            })
            .collect();

        Self {
            config,
            task_ids,
            workers,
        }
    }

    /// Run every rule for `entity` against one row.
    pub fn validate_row(&self, entity: Entity, index: usize, row: &Record) -> Vec<Diagnostic> {
        let mut out = self.check_json_columns(entity, index, row);
        match entity {
            Entity::Clients => self.validate_client(index, row, &mut out),
            Entity::Workers => self.validate_worker(index, row, &mut out),
            Entity::Tasks => self.validate_task(index, row, &mut out),
        }
        out
    }

    /// Any column whose name mentions "json" must hold a JSON object.
    fn check_json_columns(&self, entity: Entity, index: usize, row: &Record) -> Vec<Diagnostic> {
        row.iter()
            .filter(|(key, _)| normalize(key).contains("json"))
            .filter_map(|(key, value)| {
                parse::parse_object(value).err().map(|err| {
                    Diagnostic::parse_error(
                        DiagnosticCode::InvalidJson,
                        entity,
                        index,
                        key.as_str(),
                        format!("{} {}", key, err),
                    )
                })
            })
            .collect()
    }

    fn validate_client(&self, index: usize, row: &Record, out: &mut Vec<Diagnostic>) {
        self.check_priority(
            Entity::Clients,
            index,
            row,
            canonical::CLIENT_PRIORITY,
            "Priority level",
            out,
        );

        let requested = parsed_list(Entity::Clients, index, row, canonical::REQUESTED_TASKS, out);
        if let Some(requested) = requested {
            for task_id in requested {
                if !self.task_ids.contains(&task_id) {
                    out.push(Diagnostic::error(
                        DiagnosticCode::UnknownReference,
                        Entity::Clients,
                        index,
                        canonical::REQUESTED_TASKS.name(),
                        format!("Task ID not found: {}", task_id),
                    ));
                }
            }
        }
    }

    fn validate_worker(&self, index: usize, row: &Record, out: &mut Vec<Diagnostic>) {
        let slots = parsed_list(Entity::Workers, index, row, canonical::AVAILABLE_SLOTS, out);

        if let Some(ref slots) = slots {
            for slot in slots {
                if !is_numeric_slot(slot) {
                    out.push(Diagnostic::parse_error(
                        DiagnosticCode::NonNumeric,
                        Entity::Workers,
                        index,
                        canonical::AVAILABLE_SLOTS.name(),
                        format!("Available slot '{}' is not numeric", slot),
                    ));
                }
            }
        }

        // Without a parsed slot list there is nothing to compare against;
        // the parse failure above already covers the row.
        if let (Some(slots), Some(value)) = (&slots, canonical::MAX_LOAD_PER_PHASE.get(row)) {
            let max_load = to_number(value);
            let field = canonical::MAX_LOAD_PER_PHASE.name();
            if max_load.is_nan() {
                out.push(Diagnostic::error(
                    DiagnosticCode::NonNumeric,
                    Entity::Workers,
                    index,
                    field,
                    format!(
                        "Max load per phase must be numeric (got '{}')",
                        cell_to_string(value)
                    ),
                ));
            } else if max_load > slots.len() as f64 {
                out.push(Diagnostic::error(
                    DiagnosticCode::ExceedsSlots,
                    Entity::Workers,
                    index,
                    field,
                    format!(
                        "Max load per phase ({}) exceeds available slots ({})",
                        format_number(max_load),
                        slots.len()
                    ),
                ));
            }
        }

        parsed_list(Entity::Workers, index, row, canonical::WORKER_SKILLS, out);
    }

    fn validate_task(&self, index: usize, row: &Record, out: &mut Vec<Diagnostic>) {
        self.check_priority(Entity::Tasks, index, row, canonical::TASK_PRIORITY, "Priority", out);

        if let Some(value) = canonical::DURATION.get(row) {
            let duration = to_number(value);
            if !(duration >= self.config.min_duration) {
                out.push(Diagnostic::error(
                    DiagnosticCode::OutOfRange,
                    Entity::Tasks,
                    index,
                    canonical::DURATION.name(),
                    format!(
                        "Duration must be at least {} (got '{}')",
                        format_number(self.config.min_duration),
                        cell_to_string(value)
                    ),
                ));
            }
        }

        if let Some(value) = canonical::PREFERRED_PHASES.get(row) {
            let field = canonical::PREFERRED_PHASES.name();
            match parse::parse_phases(value) {
                Ok(phases) => {
                    let invalid: Vec<String> = phases
                        .iter()
                        .filter(|p| **p < self.config.min_phase)
                        .map(|p| p.to_string())
                        .collect();
                    if !invalid.is_empty() {
                        out.push(Diagnostic::error(
                            DiagnosticCode::OutOfRange,
                            Entity::Tasks,
                            index,
                            field,
                            format!(
                                "Preferred phases must be at least {} (got {})",
                                self.config.min_phase,
                                invalid.join(", ")
                            ),
                        ));
                    }
                }
                Err(err) => out.push(parse_failure(Entity::Tasks, index, field, &err)),
            }
        }

        let required = parsed_list(Entity::Tasks, index, row, canonical::REQUIRED_SKILLS, out);

        if let (Some(required), Some(value)) = (required, canonical::MAX_CONCURRENT.get(row)) {
            if is_truthy(value) {
                let max_concurrent = to_number(value);
                let qualified = self.qualified_workers(&required);
                if !(max_concurrent <= qualified as f64) {
                    out.push(Diagnostic::error(
                        DiagnosticCode::InsufficientWorkers,
                        Entity::Tasks,
                        index,
                        canonical::MAX_CONCURRENT.name(),
                        format!(
                            "MaxConcurrent exceeds qualified, available workers \
                             (requested {}, qualified {})",
                            cell_to_string(value),
                            qualified
                        ),
                    ));
                }
            }
        }
    }

    /// Priority must lie within the configured bounds; `NaN` never does.
    fn check_priority(
        &self,
        entity: Entity,
        index: usize,
        row: &Record,
        field: Field,
        label: &str,
        out: &mut Vec<Diagnostic>,
    ) {
        let Some(value) = field.get(row) else {
            return;
        };

        let priority = to_number(value);
        if !in_range(priority, self.config.priority_min, self.config.priority_max) {
            out.push(Diagnostic::error(
                DiagnosticCode::OutOfRange,
                entity,
                index,
                field.name(),
                format!(
                    "{} must be between {} and {} (got '{}')",
                    label,
                    format_number(self.config.priority_min),
                    format_number(self.config.priority_max),
                    cell_to_string(value)
                ),
            ));
        }
    }

    /// Workers holding every required skill and offering at least one slot.
    fn qualified_workers(&self, required: &[String]) -> usize {
        self.workers
            .iter()
            .filter(|w| w.has_slots && required.iter().all(|s| w.skills.contains(s)))
            .count()
    }
}

/// Parse a list field; missing columns read as an empty list.
fn list_field(row: &Record, field: Field) -> Result<Vec<String>, ParseError> {
    field
        .get(row)
        .map(parse::parse_list)
        .unwrap_or_else(|| Ok(Vec::new()))
}

/// Parse a list field, recording a parse diagnostic on failure.
fn parsed_list(
    entity: Entity,
    index: usize,
    row: &Record,
    field: Field,
    out: &mut Vec<Diagnostic>,
) -> Option<Vec<String>> {
    match list_field(row, field) {
        Ok(items) => Some(items),
        Err(err) => {
            out.push(parse_failure(entity, index, field.name(), &err));
            None
        }
    }
}

fn parse_failure(entity: Entity, index: usize, field: &str, err: &ParseError) -> Diagnostic {
    Diagnostic::parse_error(
        DiagnosticCode::MalformedList,
        entity,
        index,
        field,
        format!("{}: {}", field, err),
    )
}

/// Slots are finite numbers; `NaN` and `inf` parse as `f64` but are not
/// slots.
fn is_numeric_slot(slot: &str) -> bool {
    slot.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// Whether a cell parses to a non-empty list.
fn has_items(value: Option<&Value>) -> bool {
    value
        .map(parse::parse_list)
        .is_some_and(|r| r.is_ok_and(|items| !items.is_empty()))
}
