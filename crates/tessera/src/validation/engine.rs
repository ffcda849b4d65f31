//! The validation engine: runs every check over a snapshot.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::input::{Entity, Workbook};
use crate::rules::RuleSet;

use super::checks::{Check, CheckContext, default_checks};
use super::diagnostic::{Diagnostic, Severity};

/// Receives progress (0-100) after each stage of a pass.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// A sink that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Counts of diagnostics by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

/// Summary of one validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Rows validated across all entities.
    pub total_rows: usize,
    /// Rules that were active for the pass.
    pub active_rules: usize,
    /// Total number of diagnostics.
    pub total_diagnostics: usize,
    /// Diagnostics by severity.
    pub by_severity: DiagnosticCounts,
    /// Whether the workbook is certified (no error-level diagnostics).
    pub certified: bool,
    /// Human-readable recommendation.
    pub recommendation: String,
}

/// Result of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All diagnostics, errors first.
    pub diagnostics: Vec<Diagnostic>,
    /// Summary statistics.
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Whether the pass found no error-level diagnostics.
    pub fn is_certified(&self) -> bool {
        self.summary.certified
    }

    /// Error-level diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Diagnostics for one entity.
    pub fn for_entity(&self, entity: Entity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.entity == entity)
    }

    /// Find a diagnostic by id.
    pub fn get(&self, id: &str) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.id == id)
    }
}

/// Runs the validation stages over a workbook.
///
/// The engine holds no state between passes: every call to
/// [`validate`](Self::validate) reads the snapshot it is given and returns a
/// fresh report.
pub struct ValidationEngine {
    checks: Vec<Box<dyn Check>>,
    config: EngineConfig,
}

impl ValidationEngine {
    /// Create an engine with the standard stages and default bounds.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom bounds.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            checks: default_checks(),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the stages, in pass order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run a full pass.
    pub fn validate(&self, workbook: &Workbook, rules: &RuleSet) -> ValidationReport {
        self.validate_with_progress(workbook, rules, &mut NoProgress)
    }

    /// Run a full pass, reporting progress after each stage.
    ///
    /// Progress values are cumulative stage weights and end at 100.
    pub fn validate_with_progress(
        &self,
        workbook: &Workbook,
        rules: &RuleSet,
        progress: &mut dyn ProgressSink,
    ) -> ValidationReport {
        let ctx = CheckContext {
            workbook,
            rules,
            config: &self.config,
        };

        let mut diagnostics = Vec::new();
        let mut completed: u32 = 0;

        for check in &self.checks {
            let found = check.run(&ctx);
            debug!(stage = check.name(), diagnostics = found.len(), "Stage complete");
            diagnostics.extend(found);

            completed = (completed + check.weight() as u32).min(100);
            progress.report(completed as u8);
        }

        if completed < 100 {
            progress.report(100);
        }

        let diagnostics = dedupe_and_sort(diagnostics);
        let summary = summarize(workbook, rules, &diagnostics);

        info!(
            rows = summary.total_rows,
            errors = summary.by_severity.error,
            warnings = summary.by_severity.warning,
            "Validation pass complete"
        );

        ValidationReport {
            diagnostics,
            summary,
        }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop repeated ids and order deterministically: errors first, then
/// entity, row, field and message.
fn dedupe_and_sort(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Diagnostic> = diagnostics
        .into_iter()
        .filter(|d| seen.insert(d.id.clone()))
        .collect();

    unique.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| a.entity.cmp(&b.entity))
            .then_with(|| a.row_index.cmp(&b.row_index))
            .then_with(|| a.field.cmp(&b.field))
            .then_with(|| a.message.cmp(&b.message))
    });
    unique
}

fn summarize(
    workbook: &Workbook,
    rules: &RuleSet,
    diagnostics: &[Diagnostic],
) -> ValidationSummary {
    let mut by_severity = DiagnosticCounts::default();
    for diag in diagnostics {
        match diag.level {
            Severity::Error => by_severity.error += 1,
            Severity::Warning => by_severity.warning += 1,
            Severity::Info => by_severity.info += 1,
        }
    }

    let certified = by_severity.error == 0;
    let recommendation = if !certified {
        format!(
            "Address {} error-level issues before scheduling.",
            by_severity.error
        )
    } else if by_severity.warning > 0 {
        format!(
            "Data is consistent. Review {} warning(s) before scheduling.",
            by_severity.warning
        )
    } else {
        "Data is consistent and ready for scheduling.".to_string()
    };

    ValidationSummary {
        total_rows: workbook.total_rows(),
        active_rules: rules.active().count(),
        total_diagnostics: diagnostics.len(),
        by_severity,
        certified,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Dataset;
    use serde_json::{Value, json};

    fn workbook(clients: Vec<Value>, workers: Vec<Value>, tasks: Vec<Value>) -> Workbook {
        Workbook::new(
            Dataset::from_json_rows(clients),
            Dataset::from_json_rows(workers),
            Dataset::from_json_rows(tasks),
        )
    }

    fn clean() -> Workbook {
        workbook(
            vec![json!({"ClientID": "C1", "PriorityLevel": 3, "RequestedTaskIDs": "T1"})],
            vec![json!({
                "WorkerID": "W1",
                "AvailableSlots": "[1,2]",
                "MaxLoadPerPhase": 1,
                "Skills": "coding"
            })],
            vec![json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": "coding", "Phase": 1})],
        )
    }

    #[test]
    fn test_clean_workbook_certifies() {
        let report = ValidationEngine::new().validate(&clean(), &RuleSet::new());

        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert!(report.is_certified());
        assert_eq!(report.summary.total_rows, 3);
    }

    #[test]
    fn test_progress_monotonic_to_100() {
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);
        ValidationEngine::new().validate_with_progress(&clean(), &RuleSet::new(), &mut sink);

        assert_eq!(seen, vec![10, 20, 60, 75, 85, 100]);
    }

    #[test]
    fn test_errors_sorted_first() {
        let wb = workbook(
            vec![json!({"ClientID": "C1", "PriorityLevel": 9})],
            vec![json!({
                "WorkerID": "W1",
                "AvailableSlots": "1",
                "MaxLoadPerPhase": 1,
                "Skills": ""
            })],
            vec![json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": "welding"})],
        );
        let report = ValidationEngine::new().validate(&wb, &RuleSet::new());

        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.diagnostics[0].level, Severity::Error);
        assert_eq!(report.diagnostics[1].level, Severity::Warning);
        assert_eq!(report.summary.by_severity.error, 1);
        assert!(!report.is_certified());
    }

    #[test]
    fn test_custom_bounds() {
        let wb = workbook(vec![json!({"ClientID": "C1", "PriorityLevel": 9})], vec![], vec![]);
        let config = EngineConfig {
            priority_max: 10.0,
            ..EngineConfig::default()
        };

        let report = ValidationEngine::with_config(config).validate(&wb, &RuleSet::new());
        assert!(report.is_certified());
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            ValidationEngine::new().stages(),
            vec!["schema", "duplicates", "rows", "capacity", "skills", "rules"]
        );
    }
}
