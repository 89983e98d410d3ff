use crate::analysis::builder::GraphBuilder;
use crate::execution::config::IndexingConfig;
use crate::parsing::parser::SourceParser;
use crate::parsing::processor::{FileProcessor, ProcessingResult};
use crate::parsing::tree::ResolvedTree;
use crate::project::source::{FileSource, PathFileSource};
use crate::stats::{BuildStatistics, StatisticsInput, finalize_build_statistics};

use anyhow::{Result, anyhow};
use database::graph::{GraphHandle, KnowledgeGraph};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A freshly built graph that has not been installed yet
#[derive(Debug)]
pub struct BuildOutcome {
    pub graph: KnowledgeGraph,
    pub statistics: BuildStatistics,
}

/// Drives discovery, parallel parsing and graph construction for one project
pub struct IndexingExecutor {
    parser: Arc<dyn SourceParser>,
    config: IndexingConfig,
}

impl IndexingExecutor {
    pub fn new(parser: Arc<dyn SourceParser>, config: IndexingConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    pub fn build_project(&self, project_root: &Path) -> Result<BuildOutcome> {
        let start_time = Instant::now();
        info!(
            "Building knowledge graph for {} with {} worker threads",
            project_root.display(),
            self.config.worker_threads
        );

        let files = PathFileSource::new(project_root.to_path_buf(), Arc::clone(&self.parser))
            .get_files(&self.config)
            .map_err(|e| anyhow!("Failed to discover files in {}: {}", project_root.display(), e))?;
        info!("Discovered {} files to parse", files.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads)
            .build()?;
        let processor = FileProcessor::new(self.parser.as_ref(), self.config.max_file_size);
        let results: Vec<ProcessingResult> =
            pool.install(|| files.par_iter().map(|file| processor.process(file)).collect());

        self.finish(
            project_root.display().to_string(),
            files.len(),
            results,
            start_time,
        )
    }

    /// Build from trees that are already in memory, bypassing discovery and the parser
    pub fn build_trees(&self, label: &str, trees: Vec<ResolvedTree>) -> Result<BuildOutcome> {
        let start_time = Instant::now();
        let discovered = trees.len();
        let results = trees.into_iter().map(FileProcessor::from_tree).collect();
        self.finish(label.to_string(), discovered, results, start_time)
    }

    /// Build `project_root` and install the result as the next generation of `handle`
    pub fn rebuild(&self, project_root: &Path, handle: &GraphHandle) -> Result<BuildStatistics> {
        let BuildOutcome {
            graph,
            mut statistics,
        } = self.build_project(project_root)?;
        statistics.generation = handle.replace(graph);
        Ok(statistics)
    }

    fn finish(
        &self,
        project_path: String,
        files_discovered: usize,
        results: Vec<ProcessingResult>,
        start_time: Instant,
    ) -> Result<BuildOutcome> {
        let mut processed = Vec::new();
        let mut skipped_files = Vec::new();
        let mut errored_files = Vec::new();

        for result in results {
            match result {
                ProcessingResult::Success(file) => processed.push(file),
                ProcessingResult::Skipped(skipped) => {
                    warn!("Skipped {}: {}", skipped.file_path, skipped.reason);
                    skipped_files.push(skipped);
                }
                ProcessingResult::Error(errored) => {
                    warn!(
                        "Excluded {} after {:?} failure: {}",
                        errored.file_path, errored.error_stage, errored.error_message
                    );
                    errored_files.push(errored);
                }
            }
        }

        let files_processed = processed.len();
        let output = GraphBuilder::new().build(processed)?;

        let statistics = finalize_build_statistics(StatisticsInput {
            project_path,
            files_discovered,
            files_processed,
            skipped_files,
            errored_files,
            store: &output.store,
            report: &output.report,
            duration: start_time.elapsed(),
        });

        info!(
            "Build finished: {} processed, {} skipped, {} errored in {:.2}s",
            statistics.files_processed,
            statistics.files_skipped,
            statistics.files_errored,
            statistics.duration_seconds
        );

        Ok(BuildOutcome {
            graph: KnowledgeGraph::new(output.store, output.facts),
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::config::IndexingConfigBuilder;
    use crate::parsing::parser::JsonTreeParser;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    const ORDER_TREE: &str = r#"{
        "filePath": "src/Order.java",
        "packageName": "com.acme",
        "source": "public class Order {\n  void place() { ship(); }\n  void ship() {}\n}\n",
        "declarations": [
            {"key": "com.acme.Order", "name": "Order", "kind": "CLASS", "line": 1, "modifiers": ["public"]},
            {"key": "com.acme.Order#place()", "name": "place", "kind": "METHOD", "line": 2,
             "parent": "com.acme.Order",
             "calls": [{"target": {"name": "ship", "key": "com.acme.Order#ship()"}, "line": 2}]},
            {"key": "com.acme.Order#ship()", "name": "ship", "kind": "METHOD", "line": 3,
             "parent": "com.acme.Order"}
        ]
    }"#;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/Order.java.tree.json"), ORDER_TREE).unwrap();
        fs::write(dir.path().join("src/Broken.java.tree.json"), "{ nope").unwrap();
        dir
    }

    fn executor() -> IndexingExecutor {
        IndexingExecutor::new(Arc::new(JsonTreeParser::new()), IndexingConfigBuilder::build(2))
    }

    #[traced_test]
    #[test]
    fn test_parse_failure_does_not_abort_build() {
        let dir = project();

        let outcome = executor().build_project(dir.path()).unwrap();

        assert_eq!(outcome.statistics.files_discovered, 2);
        assert_eq!(outcome.statistics.files_processed, 1);
        assert_eq!(outcome.statistics.files_errored, 1);
        assert_eq!(outcome.statistics.errored_files[0].file_path, "src/Broken.java.tree.json");
        assert_eq!(outcome.graph.store().node_count(), 3);
        assert_eq!(outcome.graph.facts().file("src/Order.java").unwrap().lines_of_code, 4);
        assert!(logs_contain("Excluded src/Broken.java.tree.json"));
    }

    #[test]
    fn test_rebuild_installs_next_generation_with_same_counts() {
        let dir = project();
        let handle = GraphHandle::default();
        let executor = executor();

        let first = executor.rebuild(dir.path(), &handle).unwrap();
        let first_nodes = handle.current().store().nodes().to_vec();
        let second = executor.rebuild(dir.path(), &handle).unwrap();

        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert_eq!(first.node_count, second.node_count);
        assert_eq!(first.relationship_count, second.relationship_count);
        assert_eq!(handle.current().store().nodes(), first_nodes.as_slice());
    }

    #[test]
    fn test_build_trees_skips_discovery() {
        let tree: ResolvedTree = serde_json::from_str(ORDER_TREE).unwrap();
        let outcome = executor().build_trees("in-memory", vec![tree]).unwrap();

        assert_eq!(outcome.statistics.project_path, "in-memory");
        assert_eq!(outcome.statistics.relationship_count, 3);
    }

    #[test]
    fn test_missing_project_root_is_an_error() {
        let result = executor().build_project(Path::new("/no/such/project"));
        assert!(result.is_err());
    }
}
