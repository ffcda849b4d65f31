//! Referential and structural checks over the active rules.

use std::collections::HashMap;

use tracing::debug;

use crate::input::{Entity, Record, Workbook};
use crate::parse::parse_list;
use crate::schema::{Field, canonical, row_id};
use crate::validation::{Diagnostic, DiagnosticCode, DiagnosticKind};

use super::graph::DependencyGraph;
use super::rule::{RuleKind, RuleSet};

/// Check every active rule against the workbook.
///
/// Only `coRun` and `slotRestriction` carry semantic checks; the other kinds
/// are stored and exported as-is.
pub fn check_rules(workbook: &Workbook, rules: &RuleSet) -> Vec<Diagnostic> {
    let tasks: HashMap<String, &Record> = task_index(workbook);
    let mut out = Vec::new();

    for rule in rules.active() {
        match &rule.kind {
            RuleKind::CoRun { tasks: members } => check_co_run(members, &tasks, &mut out),
            RuleKind::SlotRestriction {
                client_group,
                worker_group,
                ..
            } => {
                if let Some(group) = client_group.as_deref() {
                    let field = canonical::CLIENT_GROUP;
                    check_group(workbook, Entity::Clients, field, group, &mut out);
                }
                if let Some(group) = worker_group.as_deref() {
                    let field = canonical::WORKER_GROUP;
                    check_group(workbook, Entity::Workers, field, group, &mut out);
                }
            }
            _ => {}
        }
    }

    debug!(rules = rules.len(), diagnostics = out.len(), "Checked rules");
    out
}

/// Task rows by id; the first occurrence of a duplicated id wins.
fn task_index(workbook: &Workbook) -> HashMap<String, &Record> {
    let mut index = HashMap::new();
    for row in &workbook.tasks.rows {
        if let Some(id) = row_id(Entity::Tasks, row) {
            index.entry(id).or_insert(row);
        }
    }
    index
}

fn check_co_run(members: &[String], tasks: &HashMap<String, &Record>, out: &mut Vec<Diagnostic>) {
    for id in members {
        if !tasks.contains_key(id) {
            out.push(Diagnostic::new(
                DiagnosticKind::Warning,
                DiagnosticCode::UnknownRuleTask,
                Entity::Tasks,
                None,
                canonical::DEPENDENCIES.name(),
                format!("Co-run rule references unknown task '{}'", id),
            ));
        }
    }

    if members.len() < 2 {
        return;
    }

    let graph = DependencyGraph::restricted(members, |id| {
        tasks
            .get(id)
            .and_then(|row| canonical::DEPENDENCIES.get(row))
            .and_then(|value| parse_list(value).ok())
            .unwrap_or_default()
    });

    if graph.find_cycle().is_some() {
        out.push(Diagnostic::new(
            DiagnosticKind::Structural,
            DiagnosticCode::DependencyCycle,
            Entity::Tasks,
            None,
            canonical::DEPENDENCIES.name(),
            format!(
                "Circular dependency detected in co-run group [{}]",
                members.join(", ")
            ),
        ));
    }
}

fn check_group(
    workbook: &Workbook,
    entity: Entity,
    field: Field,
    group: &str,
    out: &mut Vec<Diagnostic>,
) {
    let group = group.trim();
    if group.is_empty() {
        return;
    }

    let found = workbook
        .dataset(entity)
        .rows
        .iter()
        .any(|row| field.text(row).as_deref() == Some(group));

    if !found {
        out.push(Diagnostic::new(
            DiagnosticKind::Warning,
            DiagnosticCode::UnknownGroup,
            entity,
            None,
            field.name(),
            format!(
                "Slot restriction references {} group '{}' but no {} has that group",
                entity.singular(),
                group,
                entity.singular()
            ),
        ));
    }
}
