use database::graph::{KnowledgeGraph, NodeId, NodeType, RelationshipType};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct DeadCodeEntry {
    pub node_id: NodeId,
    pub name: String,
    pub file_path: String,
    pub line: u32,
    /// Distinct callers, not call sites
    pub caller_count: usize,
    pub is_public: bool,
    pub is_test: bool,
    pub is_potentially_dead: bool,
}

/// Liveness report for every declared method and function under `path_prefix`.
///
/// A callable is potentially dead when nothing calls it. Visibility plays no part,
/// and test callables are reported but never flagged.
pub fn find_dead_code(graph: &KnowledgeGraph, path_prefix: Option<&str>) -> Vec<DeadCodeEntry> {
    let store = graph.store();
    let facts = graph.facts();

    let mut entries: Vec<DeadCodeEntry> = [NodeType::Method, NodeType::Function]
        .into_iter()
        .flat_map(|node_type| store.find_by_type(node_type))
        .filter(|node| !node.is_external)
        .filter(|node| path_prefix.is_none_or(|prefix| node.file_path.starts_with(prefix)))
        .map(|node| {
            let caller_count = store
                .incoming(node.id, Some(RelationshipType::Calls))
                .map(|rel| rel.source_id)
                .collect::<FxHashSet<_>>()
                .len();
            let is_test = facts.is_test(node.id);
            DeadCodeEntry {
                node_id: node.id,
                name: node.name.clone(),
                file_path: node.file_path.clone(),
                line: node.line_number,
                caller_count,
                is_public: node.is_public,
                is_test,
                is_potentially_dead: !is_test && caller_count == 0,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    entries
}
