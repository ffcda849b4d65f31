//! Validation engine for the clients/workers/tasks workbook.

mod checks;
mod diagnostic;
mod engine;
mod row;

pub use checks::{
    Check, CheckContext, DuplicateIdCheck, PhaseCapacityCheck, RowCheck, RuleCheck, SchemaCheck,
    SkillCoverageCheck, default_checks,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticKind, Severity, diagnostic_id};
pub use engine::{
    DiagnosticCounts, NoProgress, ProgressSink, ValidationEngine, ValidationReport,
    ValidationSummary,
};
pub use row::RowValidator;
