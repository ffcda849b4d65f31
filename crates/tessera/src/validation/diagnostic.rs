//! Diagnostic types for validation findings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::input::Entity;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only, may not require action.
    Info,
    /// Potential issue that should be reviewed.
    Warning,
    /// Definite issue that blocks certification.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Where in the error taxonomy a finding sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// A cell could not be parsed (malformed list, object or phase text).
    Parse,
    /// A semantic rule was violated (range, reference, capacity).
    Validation,
    /// Soft advisory (coverage gaps, dangling group references).
    Warning,
    /// Structural problem inside the rule set, such as a dependency cycle.
    Structural,
    /// Informational notice.
    Notice,
}

impl DiagnosticKind {
    /// The severity every finding of this kind carries.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::Parse | DiagnosticKind::Validation | DiagnosticKind::Structural => {
                Severity::Error
            }
            DiagnosticKind::Warning => Severity::Warning,
            DiagnosticKind::Notice => Severity::Info,
        }
    }
}

/// What a diagnostic is about. Fixers key off this rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    MissingColumns,
    MissingId,
    DuplicateId,
    InvalidJson,
    MalformedList,
    OutOfRange,
    NonNumeric,
    UnknownReference,
    ExceedsSlots,
    InsufficientWorkers,
    PhaseOverload,
    UncountedDemand,
    SkillGap,
    DependencyCycle,
    UnknownGroup,
    UnknownRuleTask,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Stable id derived from entity, row, field and message.
    pub id: String,
    /// Entity the finding belongs to.
    pub entity: Entity,
    /// Row index, or `None` for dataset- and rule-level findings
    /// (serialized as `-1`).
    #[serde(with = "row_index")]
    pub row_index: Option<usize>,
    /// Canonical field name the finding is scoped to.
    pub field: String,
    /// Human-readable description.
    pub message: String,
    /// Severity level.
    pub level: Severity,
    /// Taxonomy bucket.
    pub kind: DiagnosticKind,
    /// Machine-readable cause.
    pub code: DiagnosticCode,
    /// Advisory "fixed" marker set by the caller.
    #[serde(default)]
    pub fixed: bool,
}

impl Diagnostic {
    /// Create a new diagnostic; the id is derived from the content.
    pub fn new(
        kind: DiagnosticKind,
        code: DiagnosticCode,
        entity: Entity,
        row_index: Option<usize>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let message = message.into();
        Self {
            id: diagnostic_id(entity, row_index, &field, &message),
            entity,
            row_index,
            field,
            message,
            level: kind.severity(),
            kind,
            code,
            fixed: false,
        }
    }

    /// Row-scoped error.
    pub fn error(
        code: DiagnosticCode,
        entity: Entity,
        row: usize,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(DiagnosticKind::Validation, code, entity, Some(row), field, message)
    }

    /// Row-scoped parse failure.
    pub fn parse_error(
        code: DiagnosticCode,
        entity: Entity,
        row: usize,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(DiagnosticKind::Parse, code, entity, Some(row), field, message)
    }

    /// Whether this finding is tied to a single row.
    pub fn is_row_level(&self) -> bool {
        self.row_index.is_some()
    }

    /// Whether this finding blocks certification.
    pub fn is_error(&self) -> bool {
        self.level == Severity::Error
    }
}

/// Deterministic id for `(entity, row, field, message)`.
pub fn diagnostic_id(
    entity: Entity,
    row_index: Option<usize>,
    field: &str,
    message: &str,
) -> String {
    let row = row_index.map(|r| r as i64).unwrap_or(-1);
    let mut hasher = Sha256::new();
    hasher.update(entity.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(row.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(field.as_bytes());
    hasher.update([0u8]);
    hasher.update(message.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("diag_{}", &digest[..16])
}

/// `Option<usize>` on the wire as an integer with `-1` for "no row".
mod row_index {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<usize>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(row) => serializer.serialize_i64(*row as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}
