use crate::errors::{GraphError, Result};
use crate::graph::types::{
    CodeNode, NewNode, NodeId, NodeType, Relationship, RelationshipId, RelationshipType,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Relationship ids attached to one node, split by relationship type
#[derive(Debug, Clone, Default)]
struct Adjacency {
    all: Vec<RelationshipId>,
    by_type: FxHashMap<RelationshipType, Vec<RelationshipId>>,
}

impl Adjacency {
    fn push(&mut self, relationship_type: RelationshipType, id: RelationshipId) {
        self.all.push(id);
        self.by_type.entry(relationship_type).or_default().push(id);
    }

    fn get(&self, relationship_type: Option<RelationshipType>) -> &[RelationshipId] {
        match relationship_type {
            None => &self.all,
            Some(t) => self.by_type.get(&t).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

/// Arena of nodes and relationships with pre-built lookup indices.
///
/// Ids are positions in the arena, assigned in insertion order. Every relationship
/// is validated against the arena on insert, so adjacency lists never point at a
/// missing node.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<CodeNode>,
    relationships: Vec<Relationship>,
    outgoing: Vec<Adjacency>,
    incoming: Vec<Adjacency>,
    lowercase_names: Vec<String>,
    by_key: FxHashMap<String, NodeId>,
    by_type: FxHashMap<NodeType, Vec<NodeId>>,
    by_file: BTreeMap<String, Vec<NodeId>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and return its id. Keys must be unique within the store.
    pub fn add_node(&mut self, node: NewNode) -> Result<NodeId> {
        if self.by_key.contains_key(&node.key) {
            return Err(GraphError::DuplicateKey(node.key));
        }

        let id = self.nodes.len() as NodeId;
        self.by_key.insert(node.key.clone(), id);
        self.by_type.entry(node.node_type).or_default().push(id);
        if !node.file_path.is_empty() {
            self.by_file
                .entry(node.file_path.clone())
                .or_default()
                .push(id);
        }
        self.lowercase_names.push(node.name.to_lowercase());
        self.outgoing.push(Adjacency::default());
        self.incoming.push(Adjacency::default());

        self.nodes.push(CodeNode {
            id,
            key: node.key,
            name: node.name,
            node_type: node.node_type,
            file_path: node.file_path,
            line_number: node.line_number,
            package_name: node.package_name,
            signature: node.signature,
            documentation: node.documentation,
            is_public: node.is_public,
            is_static: node.is_static,
            is_abstract: node.is_abstract,
            is_external: node.is_external,
            annotations: node.annotations,
        });

        Ok(id)
    }

    /// Insert a directed edge. Rejects edges whose endpoints are not in the store.
    pub fn add_relationship(
        &mut self,
        relationship_type: RelationshipType,
        source_id: NodeId,
        target_id: NodeId,
        line_number: Option<u32>,
        metadata: BTreeMap<String, String>,
    ) -> Result<RelationshipId> {
        if !self.contains(source_id) || !self.contains(target_id) {
            return Err(GraphError::DanglingRelationship {
                relationship_type,
                source_id,
                target_id,
            });
        }

        let id = self.relationships.len() as RelationshipId;
        self.relationships.push(Relationship {
            id,
            relationship_type,
            source_id,
            target_id,
            line_number,
            metadata,
        });
        self.outgoing[source_id as usize].push(relationship_type, id);
        self.incoming[target_id as usize].push(relationship_type, id);

        Ok(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        (id as usize) < self.nodes.len()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&CodeNode> {
        self.nodes.get(id as usize)
    }

    /// Like [`GraphStore::get_node`] but reports a missing id as an error
    pub fn node(&self, id: NodeId) -> Result<&CodeNode> {
        self.get_node(id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(id as usize)
    }

    pub fn find_by_key(&self, key: &str) -> Option<&CodeNode> {
        self.by_key.get(key).and_then(|id| self.get_node(*id))
    }

    /// Case-insensitive substring match on node names
    pub fn find_by_name(&self, name: &str) -> Vec<&CodeNode> {
        let needle = name.to_lowercase();
        self.lowercase_names
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.contains(&needle))
            .map(|(index, _)| &self.nodes[index])
            .collect()
    }

    /// Case-insensitive exact match on node names
    pub fn find_by_exact_name(&self, name: &str) -> Vec<&CodeNode> {
        let needle = name.to_lowercase();
        self.lowercase_names
            .iter()
            .enumerate()
            .filter(|(_, candidate)| **candidate == needle)
            .map(|(index, _)| &self.nodes[index])
            .collect()
    }

    pub fn find_by_type(&self, node_type: NodeType) -> Vec<&CodeNode> {
        self.by_type
            .get(&node_type)
            .map(|ids| ids.iter().map(|id| &self.nodes[*id as usize]).collect())
            .unwrap_or_default()
    }

    /// Outgoing relationships of a node, optionally restricted to one type
    pub fn outgoing(
        &self,
        id: NodeId,
        relationship_type: Option<RelationshipType>,
    ) -> impl Iterator<Item = &Relationship> + '_ {
        self.adjacent(&self.outgoing, id, relationship_type)
    }

    /// Incoming relationships of a node, optionally restricted to one type
    pub fn incoming(
        &self,
        id: NodeId,
        relationship_type: Option<RelationshipType>,
    ) -> impl Iterator<Item = &Relationship> + '_ {
        self.adjacent(&self.incoming, id, relationship_type)
    }

    fn adjacent<'a>(
        &'a self,
        index: &'a [Adjacency],
        id: NodeId,
        relationship_type: Option<RelationshipType>,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        index
            .get(id as usize)
            .map(|adjacency| adjacency.get(relationship_type))
            .unwrap_or(&[])
            .iter()
            .map(|rel_id| &self.relationships[*rel_id as usize])
    }

    /// Container of a node through an incoming CONTAINS edge
    pub fn parent_of(&self, id: NodeId) -> Option<&CodeNode> {
        self.incoming(id, Some(RelationshipType::Contains))
            .next()
            .and_then(|rel| self.get_node(rel.source_id))
    }

    /// Members of a node through outgoing CONTAINS edges
    pub fn children_of(&self, id: NodeId) -> Vec<&CodeNode> {
        self.outgoing(id, Some(RelationshipType::Contains))
            .filter_map(|rel| self.get_node(rel.target_id))
            .collect()
    }

    pub fn nodes_in_file(&self, file_path: &str) -> Vec<&CodeNode> {
        self.by_file
            .get(file_path)
            .map(|ids| ids.iter().map(|id| &self.nodes[*id as usize]).collect())
            .unwrap_or_default()
    }

    /// Distinct file paths of declared nodes, in lexical order
    pub fn files(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_file.keys().map(String::as_str)
    }

    pub fn nodes(&self) -> &[CodeNode] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}
