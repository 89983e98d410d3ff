use database::graph::{
    CodeNode, NodeId, NodeType, Relationship, RelationshipId, RelationshipType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Compact node view used in query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct QueryNode {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub file_path: String,
    pub line_number: u32,
    pub package_name: String,
    pub is_public: bool,
}

impl From<&CodeNode> for QueryNode {
    fn from(node: &CodeNode) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            node_type: node.node_type,
            file_path: node.file_path.clone(),
            line_number: node.line_number,
            package_name: node.package_name.clone(),
            is_public: node.is_public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct QueryPath {
    pub node_ids: Vec<NodeId>,
    /// Number of hops
    pub length: usize,
}

impl From<Vec<NodeId>> for QueryPath {
    fn from(node_ids: Vec<NodeId>) -> Self {
        let length = node_ids.len().saturating_sub(1);
        Self { node_ids, length }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct QueryResult {
    pub query: String,
    pub nodes: Vec<QueryNode>,
    pub paths: Vec<QueryPath>,
    pub total_results: usize,
}

/// One edge as seen from the node it was fetched for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct RelationshipView {
    pub relationship_id: RelationshipId,
    pub relationship_type: RelationshipType,
    /// The node on the other end of the edge
    pub related_node_id: NodeId,
    pub related_node_name: String,
    pub related_node_type: NodeType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl RelationshipView {
    pub fn new(relationship: &Relationship, related: &CodeNode) -> Self {
        Self {
            relationship_id: relationship.id,
            relationship_type: relationship.relationship_type,
            related_node_id: related.id,
            related_node_name: related.name.clone(),
            related_node_type: related.node_type,
            metadata: relationship.metadata.clone(),
            line_number: relationship.line_number,
        }
    }
}

/// A node together with every edge that touches it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct NodeWithRelationships {
    #[serde(flatten)]
    pub node: CodeNode,
    pub outgoing_relationships: Vec<RelationshipView>,
    pub incoming_relationships: Vec<RelationshipView>,
}

/// Sort key shared by every list of nodes handed out: type, then name, then id
pub(crate) fn node_order(a: &CodeNode, b: &CodeNode) -> std::cmp::Ordering {
    a.node_type
        .as_ref()
        .cmp(b.node_type.as_ref())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}
