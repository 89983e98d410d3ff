use crate::graph::types::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a [`VariableFact`] within one [`SourceFacts`] table
pub type VariableId = usize;

/// Per-file measurements taken while building the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacts {
    pub file_path: String,
    pub package_name: String,
    /// Non-blank, non-comment lines
    pub lines_of_code: u32,
}

/// How a closed set of variants was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariantForm {
    Enum,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub line: u32,
}

/// Ordered variants of one enum or closed union node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub form: VariantForm,
    pub variants: Vec<Variant>,
}

impl VariantSet {
    pub fn contains(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v.name == name)
    }
}

/// A field or local variable whose declared type resolved to a graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableFact {
    pub name: String,
    pub file_path: String,
    pub line: u32,
    /// Declaring type for fields, declaring callable for locals
    pub owner: NodeId,
    pub type_id: NodeId,
    /// Constant the variable starts with, when statically known
    pub initializer: Option<String>,
}

/// One `variable = value` statement inside a callable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentFact {
    pub variable: VariableId,
    pub method: NodeId,
    /// Assigned constant, `None` when the right-hand side is not a constant
    pub value: Option<String>,
    /// Constant the variable was compared against in an enclosing condition
    pub guard: Option<String>,
    pub line: u32,
}

/// Side tables extracted alongside the graph so derived analyses never re-parse
#[derive(Debug, Clone, Default)]
pub struct SourceFacts {
    files: BTreeMap<String, FileFacts>,
    decision_points: FxHashMap<NodeId, u32>,
    variables: Vec<VariableFact>,
    assignments: Vec<AssignmentFact>,
    variants: FxHashMap<NodeId, VariantSet>,
    tests: FxHashSet<NodeId>,
}

impl SourceFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file(&mut self, facts: FileFacts) {
        self.files.insert(facts.file_path.clone(), facts);
    }

    pub fn record_decision_points(&mut self, callable: NodeId, count: u32) {
        *self.decision_points.entry(callable).or_default() += count;
    }

    pub fn add_variable(&mut self, variable: VariableFact) -> VariableId {
        self.variables.push(variable);
        self.variables.len() - 1
    }

    pub fn add_assignment(&mut self, assignment: AssignmentFact) {
        self.assignments.push(assignment);
    }

    pub fn set_variants(&mut self, node: NodeId, variants: VariantSet) {
        self.variants.insert(node, variants);
    }

    /// Flag a callable as test code so liveness analyses leave it alone
    pub fn mark_test(&mut self, callable: NodeId) {
        self.tests.insert(callable);
    }

    pub fn is_test(&self, callable: NodeId) -> bool {
        self.tests.contains(&callable)
    }

    pub fn file(&self, file_path: &str) -> Option<&FileFacts> {
        self.files.get(file_path)
    }

    /// Files in lexical path order
    pub fn files(&self) -> impl Iterator<Item = &FileFacts> + '_ {
        self.files.values()
    }

    pub fn max_lines_of_code(&self) -> u32 {
        self.files
            .values()
            .map(|f| f.lines_of_code)
            .max()
            .unwrap_or(0)
    }

    pub fn decision_points(&self, callable: NodeId) -> u32 {
        self.decision_points.get(&callable).copied().unwrap_or(0)
    }

    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &VariableFact)> + '_ {
        self.variables.iter().enumerate()
    }

    pub fn variable(&self, id: VariableId) -> Option<&VariableFact> {
        self.variables.get(id)
    }

    /// Assignments to one variable, in the order they were recorded
    pub fn assignments_to(&self, variable: VariableId) -> impl Iterator<Item = &AssignmentFact> + '_ {
        self.assignments
            .iter()
            .filter(move |a| a.variable == variable)
    }

    pub fn variants_of(&self, node: NodeId) -> Option<&VariantSet> {
        self.variants.get(&node)
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_points_accumulate() {
        let mut facts = SourceFacts::new();
        facts.record_decision_points(3, 2);
        facts.record_decision_points(3, 1);
        assert_eq!(facts.decision_points(3), 3);
        assert_eq!(facts.decision_points(4), 0);
    }

    #[test]
    fn test_max_lines_of_code() {
        let mut facts = SourceFacts::new();
        assert_eq!(facts.max_lines_of_code(), 0);
        for (path, loc) in [("b.java", 40), ("a.java", 120)] {
            facts.record_file(FileFacts {
                file_path: path.to_string(),
                package_name: String::new(),
                lines_of_code: loc,
            });
        }
        assert_eq!(facts.max_lines_of_code(), 120);
        let order: Vec<&str> = facts.files().map(|f| f.file_path.as_str()).collect();
        assert_eq!(order, vec!["a.java", "b.java"]);
    }

    #[test]
    fn test_assignments_filtered_by_variable() {
        let mut facts = SourceFacts::new();
        let status = facts.add_variable(VariableFact {
            name: "status".to_string(),
            file_path: "Order.java".to_string(),
            line: 4,
            owner: 0,
            type_id: 1,
            initializer: Some("PENDING".to_string()),
        });
        let other = facts.add_variable(VariableFact {
            name: "phase".to_string(),
            file_path: "Order.java".to_string(),
            line: 5,
            owner: 0,
            type_id: 1,
            initializer: None,
        });
        for (variable, line) in [(status, 10), (other, 11), (status, 12)] {
            facts.add_assignment(AssignmentFact {
                variable,
                method: 2,
                value: Some("ACTIVE".to_string()),
                guard: None,
                line,
            });
        }

        let lines: Vec<u32> = facts.assignments_to(status).map(|a| a.line).collect();
        assert_eq!(lines, vec![10, 12]);
        assert_eq!(facts.assignment_count(), 3);
    }
}
