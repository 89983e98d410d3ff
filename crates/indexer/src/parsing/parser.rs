use crate::errors::ParseError;
use crate::parsing::tree::ResolvedTree;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One discovered file, read and ready to hand to a parser
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub absolute_path: PathBuf,
    /// Path relative to the project root, with `/` separators
    pub relative_path: String,
    pub content: String,
}

/// Port to the language parser and symbol resolver.
///
/// Implementations must be callable from several worker threads at once.
pub trait SourceParser: Send + Sync {
    /// Cheap path-based filter applied during discovery
    fn supports(&self, path: &Path) -> bool;

    fn parse(&self, file: &SourceFile) -> Result<ResolvedTree, ParseError>;
}

pub const TREE_SUFFIX: &str = ".tree.json";

/// Reads resolver output that was serialized to `<source file>.tree.json`
#[derive(Debug, Clone, Default)]
pub struct JsonTreeParser;

impl JsonTreeParser {
    pub fn new() -> Self {
        Self
    }

    fn source_path(tree_path: &str) -> &str {
        tree_path.strip_suffix(TREE_SUFFIX).unwrap_or(tree_path)
    }
}

impl SourceParser for JsonTreeParser {
    fn supports(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(TREE_SUFFIX) && name.len() > TREE_SUFFIX.len())
    }

    fn parse(&self, file: &SourceFile) -> Result<ResolvedTree, ParseError> {
        if !self.supports(&file.absolute_path) {
            return Err(ParseError::Unsupported(file.absolute_path.clone()));
        }

        let mut tree: ResolvedTree =
            serde_json::from_str(&file.content).map_err(|e| ParseError::Malformed {
                path: file.absolute_path.clone(),
                message: e.to_string(),
            })?;

        if tree.file_path.is_empty() {
            tree.file_path = Self::source_path(&file.relative_path).to_string();
        }

        if tree.source.is_none() && tree.lines_of_code.is_none() {
            let sibling = file
                .absolute_path
                .to_str()
                .map(|p| PathBuf::from(Self::source_path(p)));
            if let Some(sibling) = sibling.filter(|p| p.is_file()) {
                match fs::read_to_string(&sibling) {
                    Ok(source) => tree.source = Some(source),
                    Err(e) => debug!("No source text next to {}: {e}", sibling.display()),
                }
            }
        }

        Ok(tree)
    }
}
