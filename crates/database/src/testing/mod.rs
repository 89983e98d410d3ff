//! In-memory graph fixtures for tests in this and downstream crates

use crate::graph::{
    GraphStore, KnowledgeGraph, NewNode, NodeId, NodeType, RelationshipType, SourceFacts,
};
use std::collections::BTreeMap;

/// Builds a [`KnowledgeGraph`] node by node without going through the indexer
#[derive(Debug, Default)]
pub struct GraphFixture {
    store: GraphStore,
    facts: SourceFacts,
}

impl GraphFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, node: NewNode) -> NodeId {
        self.store
            .add_node(node)
            .expect("fixture node keys must be unique")
    }

    /// Public type declaration in `file_path`, keyed by its name
    pub fn type_node(&mut self, name: &str, node_type: NodeType, file_path: &str, line: u32) -> NodeId {
        self.node(
            NewNode::new(name, name, node_type)
                .in_file(file_path, line)
                .public(true),
        )
    }

    pub fn class(&mut self, name: &str, file_path: &str) -> NodeId {
        self.type_node(name, NodeType::Class, file_path, 1)
    }

    /// Public method contained in `owner`, declared in the owner's file
    pub fn method(&mut self, owner: NodeId, name: &str, line: u32) -> NodeId {
        self.member(owner, name, NodeType::Method, line, true)
    }

    pub fn member(
        &mut self,
        owner: NodeId,
        name: &str,
        node_type: NodeType,
        line: u32,
        is_public: bool,
    ) -> NodeId {
        let parent = self
            .store
            .get_node(owner)
            .expect("fixture owner must exist")
            .clone();
        let id = self.node(
            NewNode::new(format!("{}#{}", parent.key, name), name, node_type)
                .in_file(parent.file_path, line)
                .in_package(parent.package_name)
                .public(is_public),
        );
        self.relate(RelationshipType::Contains, owner, id);
        id
    }

    pub fn calls(&mut self, from: NodeId, to: NodeId) {
        self.calls_at(from, to, None);
    }

    pub fn calls_at(&mut self, from: NodeId, to: NodeId, line: Option<u32>) {
        self.store
            .add_relationship(RelationshipType::Calls, from, to, line, BTreeMap::new())
            .expect("fixture call endpoints must exist");
    }

    pub fn relate(&mut self, relationship_type: RelationshipType, from: NodeId, to: NodeId) {
        self.store
            .add_relationship(relationship_type, from, to, None, BTreeMap::new())
            .expect("fixture relationship endpoints must exist");
    }

    pub fn facts_mut(&mut self) -> &mut SourceFacts {
        &mut self.facts
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn build(self) -> KnowledgeGraph {
        KnowledgeGraph::new(self.store, self.facts)
    }
}
