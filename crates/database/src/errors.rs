//! Error types for the database crate

use crate::graph::{NodeId, RelationshipType};
use thiserror::Error;

/// Result type alias for graph store operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Lookup of an id that is not part of the current generation
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// An edge endpoint does not reference an existing node
    #[error("{relationship_type} relationship {source_id} -> {target_id} references a missing node")]
    DanglingRelationship {
        relationship_type: RelationshipType,
        source_id: NodeId,
        target_id: NodeId,
    },

    /// Two declarations claimed the same key
    #[error("Duplicate node key: {0}")]
    DuplicateKey(String),
}
