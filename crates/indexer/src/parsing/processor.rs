use crate::errors::ParseError;
use crate::parsing::metrics::count_lines_of_code;
use crate::parsing::parser::{SourceFile, SourceParser};
use crate::parsing::tree::ResolvedTree;
use crate::project::file_info::FileInfo;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{Duration, Instant};
use ts_rs::TS;

/// Represents a file that was skipped during processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct SkippedFile {
    pub file_path: String,
    pub reason: String,
    #[ts(type = "number | null")]
    pub file_size: Option<u64>,
}

/// Represents a file that encountered an error during processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct ErroredFile {
    pub file_path: String,
    pub error_message: String,
    pub error_stage: ProcessingStage,
}

/// Represents the stage where processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "api.ts")]
pub enum ProcessingStage {
    FileSystem, // Failed to read file metadata or content
    Parsing,    // Parser rejected the file
}

/// Tree plus the measurements taken while reading it
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    pub file_path: String,
    pub tree: ResolvedTree,
    pub lines_of_code: u32,
    pub file_size: u64,
    pub processing_time: Duration,
}

/// Result of processing a file that can be success, skipped, or error
#[derive(Debug)]
pub enum ProcessingResult {
    Success(FileProcessingResult),
    Skipped(SkippedFile),
    Error(ErroredFile),
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ProcessingResult::Skipped(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ProcessingResult::Error(_))
    }

    /// Get the file path regardless of result type
    pub fn file_path(&self) -> &str {
        match self {
            ProcessingResult::Success(result) => &result.file_path,
            ProcessingResult::Skipped(skipped) => &skipped.file_path,
            ProcessingResult::Error(errored) => &errored.file_path,
        }
    }
}

/// Runs one discovered file through the parser port
pub struct FileProcessor<'a> {
    parser: &'a dyn SourceParser,
    max_file_size: u64,
}

impl<'a> FileProcessor<'a> {
    pub fn new(parser: &'a dyn SourceParser, max_file_size: u64) -> Self {
        Self {
            parser,
            max_file_size,
        }
    }

    pub fn process(&self, file_info: &FileInfo) -> ProcessingResult {
        let start_time = Instant::now();

        if file_info.size > self.max_file_size {
            return ProcessingResult::Skipped(SkippedFile {
                file_path: file_info.relative_path.clone(),
                reason: format!(
                    "File size {} exceeds limit of {} bytes",
                    file_info.size, self.max_file_size
                ),
                file_size: Some(file_info.size),
            });
        }

        let content = match fs::read_to_string(&file_info.path) {
            Ok(content) => content,
            Err(e) => {
                return ProcessingResult::Error(ErroredFile {
                    file_path: file_info.relative_path.clone(),
                    error_message: format!("Failed to read file: {e}"),
                    error_stage: ProcessingStage::FileSystem,
                });
            }
        };

        let source_file = SourceFile {
            absolute_path: file_info.path.clone(),
            relative_path: file_info.relative_path.clone(),
            content,
        };

        match self.parser.parse(&source_file) {
            Ok(tree) => Self::success(tree, file_info.size, start_time),
            Err(ParseError::Unsupported(_)) => ProcessingResult::Skipped(SkippedFile {
                file_path: file_info.relative_path.clone(),
                reason: "Unsupported file type".to_string(),
                file_size: Some(file_info.size),
            }),
            Err(e) => ProcessingResult::Error(ErroredFile {
                file_path: file_info.relative_path.clone(),
                error_message: format!("Failed to parse: {e}"),
                error_stage: ProcessingStage::Parsing,
            }),
        }
    }

    /// Wrap a tree that was produced outside of discovery, e.g. handed over in memory
    pub fn from_tree(tree: ResolvedTree) -> ProcessingResult {
        let size = tree.source.as_ref().map_or(0, |s| s.len() as u64);
        Self::success(tree, size, Instant::now())
    }

    fn success(tree: ResolvedTree, file_size: u64, start_time: Instant) -> ProcessingResult {
        let lines_of_code = match (&tree.source, tree.lines_of_code) {
            (Some(source), _) => count_lines_of_code(source, &tree.file_path),
            (None, Some(reported)) => reported,
            (None, None) => 0,
        };

        ProcessingResult::Success(FileProcessingResult {
            file_path: tree.file_path.clone(),
            tree,
            lines_of_code,
            file_size,
            processing_time: start_time.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parser::JsonTreeParser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn file_info(dir: &TempDir, relative: &str, content: &str) -> FileInfo {
        let path = dir.path().join(relative);
        fs::write(&path, content).unwrap();
        FileInfo::new(path, relative.to_string(), content.len() as u64)
    }

    #[test]
    fn test_success_counts_lines_from_source() {
        let dir = TempDir::new().unwrap();
        let info = file_info(
            &dir,
            "Order.java.tree.json",
            r#"{"source": "class Order {\n  // note\n}\n", "declarations": []}"#,
        );
        let parser = JsonTreeParser::new();

        match FileProcessor::new(&parser, 5_000_000).process(&info) {
            ProcessingResult::Success(result) => {
                assert_eq!(result.file_path, "Order.java");
                assert_eq!(result.lines_of_code, 2);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let info = file_info(&dir, "Big.java.tree.json", r#"{"declarations": []}"#);
        let parser = JsonTreeParser::new();

        let result = FileProcessor::new(&parser, 4).process(&info);
        assert!(result.is_skipped());
        assert_eq!(result.file_path(), "Big.java.tree.json");
    }

    #[test]
    fn test_parse_failure_is_an_error_result() {
        let dir = TempDir::new().unwrap();
        let info = file_info(&dir, "Broken.java.tree.json", "{");
        let parser = JsonTreeParser::new();

        match FileProcessor::new(&parser, 5_000_000).process(&info) {
            ProcessingResult::Error(errored) => {
                assert_eq!(errored.error_stage, ProcessingStage::Parsing);
                assert!(errored.error_message.starts_with("Failed to parse"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_a_file_system_error() {
        let parser = JsonTreeParser::new();
        let info = FileInfo::new(
            PathBuf::from("/nonexistent/Gone.java.tree.json"),
            "Gone.java.tree.json".to_string(),
            10,
        );

        match FileProcessor::new(&parser, 5_000_000).process(&info) {
            ProcessingResult::Error(errored) => {
                assert_eq!(errored.error_stage, ProcessingStage::FileSystem)
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
}
