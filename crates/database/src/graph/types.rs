use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use ts_rs::TS;

/// Arena index of a node. Only meaningful within one build generation.
pub type NodeId = u32;

/// Arena index of a relationship. Only meaningful within one build generation.
pub type RelationshipId = u32;

/// Kind of declared entity a [`CodeNode`] represents
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[ts(export, export_to = "api.ts")]
pub enum NodeType {
    Class,
    Interface,
    Enum,
    /// Closed union or sealed type declaration
    TypeAlias,
    Method,
    Constructor,
    Field,
    Function,
    Component,
}

impl NodeType {
    /// Types that own members through CONTAINS edges
    pub fn is_type_declaration(&self) -> bool {
        matches!(
            self,
            NodeType::Class
                | NodeType::Interface
                | NodeType::Enum
                | NodeType::TypeAlias
                | NodeType::Component
        )
    }

    /// Types that can be the source or target of CALLS edges
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            NodeType::Method | NodeType::Constructor | NodeType::Function
        )
    }

    pub fn all_types() -> Vec<NodeType> {
        NodeType::iter().collect()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[ts(export, export_to = "api.ts")]
pub enum RelationshipType {
    Calls,
    Inherits,
    Implements,
    References,
    Contains,
}

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    pub fn all_types() -> Vec<RelationshipType> {
        RelationshipType::iter().collect()
    }

    /// INHERITS and IMPLEMENTS both describe a supertype edge
    pub fn is_inheritance(&self) -> bool {
        matches!(
            self,
            RelationshipType::Inherits | RelationshipType::Implements
        )
    }
}

/// One declared entity in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct CodeNode {
    pub id: NodeId,
    /// Resolver-assigned qualified symbol key, stable across builds
    pub key: String,
    pub name: String,
    pub node_type: NodeType,
    /// Empty for external nodes created for unresolved targets
    pub file_path: String,
    pub line_number: u32,
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub is_public: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl CodeNode {
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations
            .iter()
            .any(|a| a.trim_start_matches('@').eq_ignore_ascii_case(annotation))
    }
}

/// Node data without an id, as handed to [`crate::graph::GraphStore::add_node`]
#[derive(Debug, Clone)]
pub struct NewNode {
    pub key: String,
    pub name: String,
    pub node_type: NodeType,
    pub file_path: String,
    pub line_number: u32,
    pub package_name: String,
    pub signature: Option<String>,
    pub documentation: Option<String>,
    pub is_public: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_external: bool,
    pub annotations: Vec<String>,
}

impl NewNode {
    pub fn new(key: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            node_type,
            file_path: String::new(),
            line_number: 0,
            package_name: String::new(),
            signature: None,
            documentation: None,
            is_public: false,
            is_static: false,
            is_abstract: false,
            is_external: false,
            annotations: Vec::new(),
        }
    }

    pub fn in_file(mut self, file_path: impl Into<String>, line_number: u32) -> Self {
        self.file_path = file_path.into();
        self.line_number = line_number;
        self
    }

    pub fn in_package(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self.file_path.clear();
        self
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct Relationship {
    pub id: RelationshipId,
    pub relationship_type: RelationshipType,
    pub source_id: NodeId,
    pub target_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}
