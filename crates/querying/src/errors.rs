//! Error types for the querying crate

use database::graph::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query text could not be parsed; `token` is the offending piece
    #[error("Invalid query at '{token}': {reason}")]
    InvalidQuery { token: String, reason: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A named entity (method, file, type) matched nothing in the current graph
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl QueryError {
    pub fn invalid(token: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidQuery {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        QueryError::NotFound {
            kind,
            name: name.into(),
        }
    }
}
