//! Recovers state machines from variables typed with an enum or closed union.
//!
//! Every variant of the variable's type is a state. Every constant assignment to the
//! variable is a transition out of the value the variable most likely held right
//! before it, in this order of preference:
//!
//! 1. the constant the assignment is guarded by (`if (status == PENDING) status = ACTIVE`)
//! 2. the closest earlier assignment in the same callable
//! 3. the variable's initializer
//!
//! and [`UNKNOWN_STATE`] otherwise.

use database::graph::{AssignmentFact, KnowledgeGraph, VariableFact, VariantForm, VariantSet};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use ts_rs::TS;

/// State used when the value before a transition cannot be determined
pub const UNKNOWN_STATE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "api.ts")]
pub enum StateSourceType {
    Enum,
    Union,
}

impl From<VariantForm> for StateSourceType {
    fn from(form: VariantForm) -> Self {
        match form {
            VariantForm::Enum => StateSourceType::Enum,
            VariantForm::Union => StateSourceType::Union,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct StateInfo {
    pub id: String,
    pub label: String,
    /// Declaration line of the variant, 0 for the unknown state
    pub line: u32,
    pub source_type: StateSourceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct TransitionInfo {
    pub from: String,
    pub to: String,
    /// Name of the callable performing the assignment
    pub trigger: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct StateMachineInfo {
    pub variable_name: String,
    pub variable_type: String,
    pub file_path: String,
    pub declaration_line: u32,
    pub states: Vec<StateInfo>,
    pub transitions: Vec<TransitionInfo>,
}

/// One entry per variable with a variant-bearing type, ordered by file then declaration line
pub fn extract_state_machines(
    graph: &KnowledgeGraph,
    path_prefix: Option<&str>,
) -> Vec<StateMachineInfo> {
    let facts = graph.facts();
    let mut machines: Vec<StateMachineInfo> = facts
        .variables()
        .filter(|(_, variable)| {
            path_prefix.is_none_or(|prefix| variable.file_path.starts_with(prefix))
        })
        .filter_map(|(variable_id, variable)| {
            let variants = facts.variants_of(variable.type_id)?;
            let assignments: Vec<&AssignmentFact> = facts.assignments_to(variable_id).collect();
            Some(build_machine(graph, variable, variants, &assignments))
        })
        .collect();

    machines.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then_with(|| a.declaration_line.cmp(&b.declaration_line))
            .then_with(|| a.variable_name.cmp(&b.variable_name))
    });
    machines
}

fn build_machine(
    graph: &KnowledgeGraph,
    variable: &VariableFact,
    variants: &VariantSet,
    assignments: &[&AssignmentFact],
) -> StateMachineInfo {
    let source_type = StateSourceType::from(variants.form);
    let mut states: Vec<StateInfo> = variants
        .variants
        .iter()
        .map(|variant| StateInfo {
            id: variant.name.clone(),
            label: variant.name.clone(),
            line: variant.line,
            source_type,
        })
        .collect();

    let mut transitions: Vec<TransitionInfo> = assignments
        .iter()
        .filter_map(|assignment| {
            let to = variant_value(variants, assignment.value.as_deref())?;
            let from =
                prior_value(variable, variants, assignment, assignments).unwrap_or(UNKNOWN_STATE);
            let trigger = graph
                .store()
                .get_node(assignment.method)
                .map(|node| node.name.clone())
                .unwrap_or_default();
            Some(TransitionInfo {
                from: from.to_string(),
                to: to.to_string(),
                trigger,
                line: assignment.line,
            })
        })
        .collect();
    transitions.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.trigger.cmp(&b.trigger)));

    if transitions.iter().any(|t| t.from == UNKNOWN_STATE) {
        states.push(StateInfo {
            id: UNKNOWN_STATE.to_string(),
            label: UNKNOWN_STATE.to_string(),
            line: 0,
            source_type,
        });
    }

    let variable_type = graph
        .store()
        .get_node(variable.type_id)
        .map(|node| node.name.clone())
        .unwrap_or_default();

    StateMachineInfo {
        variable_name: variable.name.clone(),
        variable_type,
        file_path: variable.file_path.clone(),
        declaration_line: variable.line,
        states,
        transitions,
    }
}

/// `value` if it names one of `variants`
fn variant_value<'a>(variants: &VariantSet, value: Option<&'a str>) -> Option<&'a str> {
    value.filter(|v| variants.contains(v))
}

fn prior_value<'a>(
    variable: &'a VariableFact,
    variants: &VariantSet,
    assignment: &'a AssignmentFact,
    assignments: &[&'a AssignmentFact],
) -> Option<&'a str> {
    if let Some(guard) = variant_value(variants, assignment.guard.as_deref()) {
        return Some(guard);
    }

    let previous = assignments
        .iter()
        .filter(|other| other.method == assignment.method && other.line < assignment.line)
        .max_by_key(|other| other.line);
    if let Some(previous) = previous {
        // a non-constant store in between hides the initializer
        return variant_value(variants, previous.value.as_deref());
    }

    variant_value(variants, variable.initializer.as_deref())
}
