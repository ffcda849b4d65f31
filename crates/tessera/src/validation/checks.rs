//! Dataset-level checks run by the validation engine.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::EngineConfig;
use crate::input::{Entity, Record, Workbook};
use crate::parse::{format_number, parse_list, parse_phases, to_number};
use crate::rules::{RuleSet, check_rules};
use crate::schema::fields::has_header;
use crate::schema::{EntitySchema, canonical, id_field, row_id};

use super::diagnostic::{Diagnostic, DiagnosticCode, DiagnosticKind};
use super::row::RowValidator;

/// What every check reads: the snapshot, the rules and the bounds.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub workbook: &'a Workbook,
    pub rules: &'a RuleSet,
    pub config: &'a EngineConfig,
}

/// One stage of a validation pass.
///
/// A check only reads the context and returns its own findings, so the
/// stages can run in any order and produce the same set.
pub trait Check {
    /// Stage name, used in logs.
    fn name(&self) -> &'static str;

    /// Share of the progress bar this stage accounts for.
    fn weight(&self) -> u8;

    /// Run the check.
    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic>;
}

/// Required columns per non-empty entity.
pub struct SchemaCheck;

impl Check for SchemaCheck {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn weight(&self) -> u8 {
        10
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        for entity in Entity::ALL {
            let dataset = ctx.workbook.dataset(entity);
            if dataset.is_empty() {
                continue;
            }

            let missing = EntitySchema::for_entity(entity).missing_columns(&dataset.headers);
            if !missing.is_empty() {
                out.push(Diagnostic::new(
                    DiagnosticKind::Validation,
                    DiagnosticCode::MissingColumns,
                    entity,
                    None,
                    "schema",
                    format!("Missing required columns: {}", missing.join(", ")),
                ));
            }
        }

        out
    }
}

/// Per-entity duplicate and missing ids.
pub struct DuplicateIdCheck;

impl Check for DuplicateIdCheck {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn weight(&self) -> u8 {
        10
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        for entity in Entity::ALL {
            let dataset = ctx.workbook.dataset(entity);
            let field = id_field(entity);
            // A missing id column is already a schema finding.
            let has_id_column = has_header(&dataset.headers, field.candidates());
            let mut first_seen: HashMap<String, usize> = HashMap::new();

            for (index, row) in dataset.rows.iter().enumerate() {
                let Some(id) = row_id(entity, row) else {
                    if has_id_column {
                        out.push(Diagnostic::error(
                            DiagnosticCode::MissingId,
                            entity,
                            index,
                            field.name(),
                            format!("Missing {} ID", entity.singular()),
                        ));
                    }
                    continue;
                };

                match first_seen.get(&id) {
                    Some(first) => out.push(Diagnostic::error(
                        DiagnosticCode::DuplicateId,
                        entity,
                        index,
                        field.name(),
                        format!("Duplicate ID '{}' (also found at row {})", id, first + 1),
                    )),
                    None => {
                        first_seen.insert(id, index);
                    }
                }
            }
        }

        out
    }
}

/// Per-row field rules over every entity.
pub struct RowCheck;

impl Check for RowCheck {
    fn name(&self) -> &'static str {
        "rows"
    }

    fn weight(&self) -> u8 {
        40
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let validator = RowValidator::new(ctx.workbook, ctx.config);

        Entity::ALL
            .iter()
            .flat_map(|&entity| {
                let validator = &validator;
                ctx.workbook
                    .dataset(entity)
                    .rows
                    .iter()
                    .enumerate()
                    .flat_map(move |(index, row)| validator.validate_row(entity, index, row))
            })
            .collect()
    }
}

/// Worker slots against task demand, per phase.
///
/// Only tasks with a single explicit `phase` contribute demand. Tasks that
/// give only `preferredPhases` are counted separately and surfaced as one
/// info notice.
pub struct PhaseCapacityCheck;

impl Check for PhaseCapacityCheck {
    fn name(&self) -> &'static str {
        "capacity"
    }

    fn weight(&self) -> u8 {
        15
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let mut available: BTreeMap<i64, usize> = BTreeMap::new();
        for row in &ctx.workbook.workers.rows {
            let Some(Ok(slots)) = canonical::AVAILABLE_SLOTS.get(row).map(parse_list) else {
                continue;
            };
            for phase in slots.iter().filter_map(|s| slot_phase(s)) {
                *available.entry(phase).or_insert(0) += 1;
            }
        }

        let mut required: BTreeMap<i64, f64> = BTreeMap::new();
        let mut uncounted = 0usize;
        for row in &ctx.workbook.tasks.rows {
            let single_phase = canonical::PHASE
                .get(row)
                .and_then(|value| parse_phases(value).ok())
                .filter(|phases| phases.len() == 1)
                .map(|phases| phases[0]);

            match single_phase {
                Some(phase) => {
                    let duration = canonical::DURATION.get(row).map(to_number).unwrap_or(0.0);
                    if duration.is_finite() && duration > 0.0 {
                        *required.entry(phase).or_insert(0.0) += duration;
                    }
                }
                None => {
                    if has_preferred_phases(row) {
                        uncounted += 1;
                    }
                }
            }
        }

        let mut out: Vec<Diagnostic> = required
            .iter()
            .filter_map(|(phase, &needed)| {
                let slots = available.get(phase).copied().unwrap_or(0);
                (needed > slots as f64).then(|| {
                    Diagnostic::new(
                        DiagnosticKind::Validation,
                        DiagnosticCode::PhaseOverload,
                        Entity::Tasks,
                        None,
                        canonical::PHASE.name(),
                        format!(
                            "Phase {} overloaded: requires {} slots, but only {} are available.",
                            phase,
                            format_number(needed),
                            slots
                        ),
                    )
                })
            })
            .collect();

        if ctx.config.report_uncounted_demand && uncounted > 0 {
            out.push(Diagnostic::new(
                DiagnosticKind::Notice,
                DiagnosticCode::UncountedDemand,
                Entity::Tasks,
                None,
                canonical::PREFERRED_PHASES.name(),
                format!(
                    "{} task(s) give only preferred phases and are not counted in phase capacity",
                    uncounted
                ),
            ));
        }

        out
    }
}

fn slot_phase(slot: &str) -> Option<i64> {
    let value = slot.trim().parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

fn has_preferred_phases(row: &Record) -> bool {
    canonical::PREFERRED_PHASES
        .get(row)
        .is_some_and(|value| parse_phases(value).is_ok_and(|p| !p.is_empty()))
}

/// Skills that tasks require but no worker offers.
pub struct SkillCoverageCheck;

impl Check for SkillCoverageCheck {
    fn name(&self) -> &'static str {
        "skills"
    }

    fn weight(&self) -> u8 {
        10
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        let provided: HashSet<String> = ctx
            .workbook
            .workers
            .rows
            .iter()
            .filter_map(|row| canonical::WORKER_SKILLS.get(row))
            .filter_map(|value| parse_list(value).ok())
            .flatten()
            .collect();

        let required: BTreeSet<String> = ctx
            .workbook
            .tasks
            .rows
            .iter()
            .filter_map(|row| canonical::REQUIRED_SKILLS.get(row))
            .filter_map(|value| parse_list(value).ok())
            .flatten()
            .collect();

        required
            .iter()
            .filter(|skill| !provided.contains(*skill))
            .map(|skill| {
                Diagnostic::new(
                    DiagnosticKind::Warning,
                    DiagnosticCode::SkillGap,
                    Entity::Tasks,
                    None,
                    canonical::REQUIRED_SKILLS.name(),
                    format!(
                        "Skill '{}' required by tasks but not provided by any worker.",
                        skill
                    ),
                )
            })
            .collect()
    }
}

/// Checks over the active business rules.
pub struct RuleCheck;

impl Check for RuleCheck {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn weight(&self) -> u8 {
        15
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Diagnostic> {
        check_rules(ctx.workbook, ctx.rules)
    }
}

/// The standard stages, in pass order.
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(SchemaCheck),
        Box::new(DuplicateIdCheck),
        Box::new(RowCheck),
        Box::new(PhaseCapacityCheck),
        Box::new(SkillCoverageCheck),
        Box::new(RuleCheck),
    ]
}
