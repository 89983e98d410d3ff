use crate::execution::config::IndexingConfigBuilder;
use crate::execution::executor::{BuildOutcome, IndexingExecutor};
use crate::parsing::parser::SourceParser;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{Level, error, info, warn};

fn progress_with_tracing<F>(message: &str, progress: &mut F, level: Level)
where
    F: FnMut(&str),
{
    progress(message);
    match level {
        Level::INFO => info!("{message}"),
        Level::WARN => warn!("{message}"),
        Level::ERROR => error!("{message}"),
        _ => info!("{message}"),
    }
}

/// Build one project, reporting human-readable progress through `progress`
pub fn run_project_indexer<F>(
    parser: Arc<dyn SourceParser>,
    project_path: &Path,
    threads: usize,
    mut progress: F,
) -> Result<BuildOutcome>
where
    F: FnMut(&str),
{
    let config = IndexingConfigBuilder::build(threads);

    progress_with_tracing(
        "🚀 Starting knowledge graph build...",
        &mut progress,
        Level::INFO,
    );
    progress_with_tracing(
        &format!("📂 Project: {}", project_path.display()),
        &mut progress,
        Level::INFO,
    );
    progress_with_tracing("⚙️ Indexing configuration:", &mut progress, Level::INFO);
    progress_with_tracing(
        &format!("  • Worker threads: {}", config.worker_threads),
        &mut progress,
        Level::INFO,
    );
    progress_with_tracing(
        &format!("  • Max file size: {} MB", config.max_file_size / 1_000_000),
        &mut progress,
        Level::INFO,
    );
    progress_with_tracing(
        &format!("  • Respect .gitignore: {}", config.respect_gitignore),
        &mut progress,
        Level::INFO,
    );

    let executor = IndexingExecutor::new(parser, config);
    let outcome = match executor.build_project(project_path) {
        Ok(outcome) => outcome,
        Err(e) => {
            progress_with_tracing(
                &format!("❌ Build failed: {e}"),
                &mut progress,
                Level::ERROR,
            );
            return Err(e);
        }
    };

    let statistics = &outcome.statistics;
    progress_with_tracing(
        &format!(
            "✅ Processed {} of {} files ({} skipped, {} errored) in {:.2}s",
            statistics.files_processed,
            statistics.files_discovered,
            statistics.files_skipped,
            statistics.files_errored,
            statistics.duration_seconds
        ),
        &mut progress,
        Level::INFO,
    );
    progress_with_tracing(
        &format!(
            "🕸️ Graph: {} nodes ({} external), {} relationships",
            statistics.node_count, statistics.external_node_count, statistics.relationship_count
        ),
        &mut progress,
        Level::INFO,
    );

    for errored in &statistics.errored_files {
        progress_with_tracing(
            &format!("  ⚠️ {}: {}", errored.file_path, errored.error_message),
            &mut progress,
            Level::WARN,
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parser::JsonTreeParser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reports_progress_and_returns_outcome() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("A.java.tree.json"),
            r#"{"declarations": [{"key": "A", "name": "A", "kind": "CLASS", "line": 1}]}"#,
        )
        .unwrap();

        let mut messages = Vec::new();
        let outcome = run_project_indexer(Arc::new(JsonTreeParser::new()), dir.path(), 1, |m| {
            messages.push(m.to_string())
        })
        .unwrap();

        assert_eq!(outcome.statistics.node_count, 1);
        assert!(messages.iter().any(|m| m.starts_with("✅ Processed 1 of 1 files")));
    }
}
