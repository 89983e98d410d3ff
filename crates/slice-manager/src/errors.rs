//! Error types for the slice-manager crate

use database::graph::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for slice operations
pub type Result<T> = std::result::Result<T, SliceError>;

/// Failures of the persistence port, passed through to callers unchanged
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// IO operations failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to create data directory
    #[error("Failed to create data directory: {path:?}")]
    DataDirectoryCreationFailed { path: PathBuf },

    /// Failed to determine system data directory
    #[error("Failed to determine system data directory")]
    SystemDataDirectoryNotFound,
}

#[derive(Error, Debug)]
pub enum SliceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A seed or added node id does not exist in the current graph
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Slice not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
