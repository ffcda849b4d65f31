//! Integration tests for Tessera.

use std::collections::HashSet;
use std::io::Write;

use serde_json::{Value, json};
use tempfile::{NamedTempFile, TempDir};

use tessera::input::write_delimited;
use tessera::{
    CsvLoader, Dataset, DiagnosticCode, DiagnosticKind, Entity, RuleKind, RuleSet, Session,
    Severity, ValidationEngine, Workbook,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn workbook(clients: Vec<Value>, workers: Vec<Value>, tasks: Vec<Value>) -> Workbook {
    Workbook::new(
        Dataset::from_json_rows(clients),
        Dataset::from_json_rows(workers),
        Dataset::from_json_rows(tasks),
    )
}

/// A small workbook with a handful of deliberate problems.
fn messy_workbook() -> Workbook {
    workbook(
        vec![
            json!({
                "ClientID": "C1",
                "PriorityLevel": 7,
                "RequestedTaskIDs": "T1,T9",
                "AttributesJSON": "{\"vip\":true}"
            }),
            json!({
                "ClientID": "C2",
                "PriorityLevel": 2,
                "RequestedTaskIDs": "T2",
                "AttributesJSON": "oops"
            }),
        ],
        vec![
            json!({
                "WorkerID": "W1",
                "AvailableSlots": "[1,2]",
                "MaxLoadPerPhase": 3,
                "Skills": "coding"
            }),
            json!({
                "WorkerID": "W2",
                "AvailableSlots": "[1",
                "MaxLoadPerPhase": 1,
                "Skills": "coding"
            }),
        ],
        vec![
            json!({
                "TaskID": "T1",
                "Duration": 0,
                "RequiredSkills": "coding",
                "PreferredPhases": "1-2"
            }),
            json!({
                "TaskID": "T2",
                "Duration": 2,
                "RequiredSkills": "welding",
                "PreferredPhases": "2,a"
            }),
            json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": "coding"}),
        ],
    )
}

fn ids(diags: &[tessera::Diagnostic]) -> HashSet<String> {
    diags.iter().map(|d| d.id.clone()).collect()
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_validation_is_idempotent() {
    let wb = messy_workbook();
    let engine = ValidationEngine::new();
    let rules = RuleSet::new();

    let first = engine.validate(&wb, &rules);
    let second = engine.validate(&wb, &rules);

    assert!(!first.diagnostics.is_empty());
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(ids(&first.diagnostics), ids(&second.diagnostics));
}

#[test]
fn test_messy_workbook_findings() {
    let report = ValidationEngine::new().validate(&messy_workbook(), &RuleSet::new());
    let codes: Vec<DiagnosticCode> = report.diagnostics.iter().map(|d| d.code).collect();

    assert!(codes.contains(&DiagnosticCode::OutOfRange));
    assert!(codes.contains(&DiagnosticCode::UnknownReference));
    assert!(codes.contains(&DiagnosticCode::InvalidJson));
    assert!(codes.contains(&DiagnosticCode::ExceedsSlots));
    assert!(codes.contains(&DiagnosticCode::MalformedList));
    assert!(codes.contains(&DiagnosticCode::DuplicateId));
    assert!(codes.contains(&DiagnosticCode::SkillGap));
    assert!(codes.contains(&DiagnosticCode::UncountedDemand));
    assert!(!report.is_certified());

    // Errors come before warnings, warnings before info.
    let levels: Vec<Severity> = report.diagnostics.iter().map(|d| d.level).collect();
    let mut sorted = levels.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(levels, sorted);
}

// =============================================================================
// Row Rules
// =============================================================================

#[test]
fn test_priority_bounds_across_entities() {
    let bad = [json!(0), json!(6), json!("urgent")];
    let good = [json!(1), json!(3), json!("5")];

    for value in bad.iter() {
        let wb = workbook(
            vec![json!({"ClientID": "C1", "PriorityLevel": value.clone()})],
            vec![],
            vec![json!({
                "TaskID": "T1",
                "Duration": 1,
                "RequiredSkills": "",
                "Priority": value.clone()
            })],
        );
        let report = ValidationEngine::new().validate(&wb, &RuleSet::new());
        let fields: Vec<&str> = report.errors().map(|d| d.field.as_str()).collect();
        assert_eq!(fields.len(), 2, "value {value}");
        assert!(fields.contains(&"priorityLevel"));
        assert!(fields.contains(&"priority"));
    }

    for value in good.iter() {
        let wb = workbook(
            vec![json!({"ClientID": "C1", "PriorityLevel": value.clone()})],
            vec![],
            vec![json!({
                "TaskID": "T1",
                "Duration": 1,
                "RequiredSkills": "",
                "Priority": value.clone()
            })],
        );
        let report = ValidationEngine::new().validate(&wb, &RuleSet::new());
        assert!(report.is_certified(), "value {value}: {:?}", report.diagnostics);
    }
}

#[test]
fn test_duplicate_task_ids() {
    let wb = workbook(
        vec![],
        vec![],
        vec![
            json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": ""}),
            json!({"TaskID": "T2", "Duration": 1, "RequiredSkills": ""}),
            json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": ""}),
        ],
    );
    let report = ValidationEngine::new().validate(&wb, &RuleSet::new());
    let dups: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::DuplicateId)
        .collect();

    assert_eq!(dups.len(), 1);
    assert_eq!(dups[0].row_index, Some(2));
    assert!(dups[0].message.contains("row 1"));
}

#[test]
fn test_headers_matched_loosely() {
    let wb = workbook(
        vec![json!({"client_id": "C1", "Priority Level": 3})],
        vec![json!({"Worker ID": "W1", "slots": "1", "Max Load": 1, "worker skills": "a"})],
        vec![json!({"task-id": "T1", "Task Duration": 1, "required_skills": "a"})],
    );
    let report = ValidationEngine::new().validate(&wb, &RuleSet::new());
    assert!(report.is_certified(), "{:?}", report.diagnostics);
}

#[test]
fn test_missing_required_columns() {
    let wb = workbook(vec![], vec![], vec![json!({"TaskID": "T1"})]);
    let report = ValidationEngine::new().validate(&wb, &RuleSet::new());
    let schema: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::MissingColumns)
        .collect();

    assert_eq!(schema.len(), 1);
    assert_eq!(schema[0].entity, Entity::Tasks);
    assert_eq!(schema[0].row_index, None);
    assert!(schema[0].message.contains("duration"));
    assert!(schema[0].message.contains("requiredSkills"));
}

// =============================================================================
// Capacity and Coverage
// =============================================================================

#[test]
fn test_phase_saturation() {
    let wb = workbook(
        vec![],
        vec![
            json!({"WorkerID": "W1", "AvailableSlots": "[1]", "MaxLoadPerPhase": 1, "Skills": "a"}),
            json!({"WorkerID": "W2", "AvailableSlots": "[1]", "MaxLoadPerPhase": 1, "Skills": "a"}),
        ],
        vec![
            json!({"TaskID": "T1", "Duration": 3, "RequiredSkills": "a", "Phase": 1}),
            json!({"TaskID": "T2", "Duration": 2, "RequiredSkills": "a", "Phase": 1}),
        ],
    );
    let report = ValidationEngine::new().validate(&wb, &RuleSet::new());

    assert_eq!(report.diagnostics.len(), 1);
    assert!(
        report.diagnostics[0]
            .message
            .contains("requires 5 slots, but only 2 are available.")
    );
}

#[test]
fn test_skill_gap_single_warning() {
    let wb = workbook(
        vec![],
        vec![json!({
            "WorkerID": "W1",
            "AvailableSlots": "1",
            "MaxLoadPerPhase": 1,
            "Skills": "coding"
        })],
        vec![
            json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": "welding"}),
            json!({"TaskID": "T2", "Duration": 1, "RequiredSkills": "welding,coding"}),
        ],
    );
    let report = ValidationEngine::new().validate(&wb, &RuleSet::new());

    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].level, Severity::Warning);
    assert!(report.diagnostics[0].message.contains("welding"));
    assert!(report.is_certified());
}

// =============================================================================
// Rules
// =============================================================================

#[test]
fn test_co_run_cycle_and_repair() {
    let mut session = Session::new(workbook(
        vec![],
        vec![],
        vec![
            json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": "", "Dependencies": "T2"}),
            json!({"TaskID": "T2", "Duration": 1, "RequiredSkills": "", "Dependencies": "T3"}),
            json!({"TaskID": "T3", "Duration": 1, "RequiredSkills": "", "Dependencies": "T1"}),
        ],
    ));
    session.add_rule(RuleKind::CoRun {
        tasks: vec!["T1".into(), "T2".into(), "T3".into()],
    });

    let structural: Vec<_> = session
        .diagnostics()
        .into_iter()
        .filter(|d| d.kind == DiagnosticKind::Structural)
        .collect();
    assert_eq!(structural.len(), 1);
    assert_eq!(structural[0].row_index, None);

    session
        .set_field(Entity::Tasks, 2, "dependencies", json!(""))
        .unwrap();
    assert!(session.report().is_certified());
}

// =============================================================================
// Mutation
// =============================================================================

#[test]
fn test_edit_removes_only_target_diagnostic() {
    let mut session = Session::new(messy_workbook());
    let before = ids(&session.diagnostics());

    let target = session
        .diagnostics()
        .into_iter()
        .find(|d| d.entity == Entity::Clients && d.field == "priorityLevel")
        .unwrap();

    session
        .set_field(Entity::Clients, 0, "priorityLevel", json!(3))
        .unwrap();
    let after = ids(&session.diagnostics());

    let mut expected = before;
    expected.remove(&target.id);
    assert_eq!(after, expected);
}

#[test]
fn test_out_of_range_edit_is_error() {
    let mut session = Session::new(messy_workbook());
    assert!(
        session
            .set_field(Entity::Workers, 10, "skills", json!("a"))
            .is_err()
    );
    assert_eq!(session.generation(), 0);
}

// =============================================================================
// File Round Trip
// =============================================================================

#[test]
fn test_load_validate_and_write_back() {
    let clients = create_test_file("ClientID,PriorityLevel,RequestedTaskIDs\nC1,9,T1\n");
    let workers = create_test_file(
        "WorkerID\tAvailableSlots\tMaxLoadPerPhase\tSkills\nW1\t\"[1,2]\"\t1\tcoding\n",
    );
    let tasks = create_test_file("TaskID,Duration,RequiredSkills\nT1,1,coding\n");

    let loader = CsvLoader::new();
    let (c, meta) = loader.load_file(Entity::Clients, clients.path()).unwrap();
    let (w, _) = loader.load_file(Entity::Workers, workers.path()).unwrap();
    let (t, _) = loader.load_file(Entity::Tasks, tasks.path()).unwrap();
    assert_eq!(meta.format, "csv");
    assert_eq!(meta.row_count, 1);

    let mut session = Session::new(Workbook::new(c, w, t));
    assert_eq!(session.report().summary.by_severity.error, 1);

    let outcome = session.apply_fixes(&tessera::RuleBasedFixer::new()).unwrap();
    assert_eq!(outcome.applied.len(), 1);
    assert!(session.report().is_certified());

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("clients.fixed.csv");
    write_delimited(&session.workbook().clients, &out, b',').unwrap();

    let (reloaded, _) = loader.load_file(Entity::Clients, &out).unwrap();
    assert_eq!(reloaded.rows[0]["PriorityLevel"], json!("5"));
}
