//! Error types for the indexer crate

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn one source file into a resolved tree
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed resolved tree in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// The parser does not handle this kind of file
    #[error("Unsupported file: {0}")]
    Unsupported(PathBuf),
}

impl ParseError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ParseError::Unsupported(_))
    }
}
