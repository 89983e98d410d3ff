use anyhow::Result;
use indexer::parsing::parser::JsonTreeParser;
use indexer::runner::run_project_indexer;
use indexer::stats::BuildStatistics;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

fn export_statistics(statistics: &BuildStatistics, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(statistics)?;
    fs::write(path, json)?;
    Ok(())
}

fn handle_statistics_output(statistics: &BuildStatistics, stats_output: Option<Option<PathBuf>>) {
    let Some(stats_path_option) = stats_output else {
        return;
    };

    if let Some(stats_path) = stats_path_option {
        match export_statistics(statistics, &stats_path) {
            Ok(()) => info!("Statistics saved to: {}", stats_path.display()),
            Err(e) => error!("Failed to save statistics: {e}"),
        }
    }

    info!("Build Summary:");
    info!("  - Files: {}", statistics.files_processed);
    info!("  - Nodes: {}", statistics.node_count);
    info!("  - Relationships: {}", statistics.relationship_count);
    if statistics.duplicate_key_count > 0 {
        info!("  - Duplicate keys: {}", statistics.duplicate_key_count);
    }

    if !statistics.node_type_counts.is_empty() {
        info!("Node Types:");
        let mut node_types: Vec<(&String, &usize)> = statistics.node_type_counts.iter().collect();
        node_types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (node_type, count) in node_types {
            info!("  - {node_type}: {count}");
        }
    }
}

pub fn run(
    project_path: PathBuf,
    threads: usize,
    stats_output: Option<Option<PathBuf>>,
) -> Result<BuildStatistics> {
    let canonical_project_path = project_path.canonicalize()?;
    let outcome = run_project_indexer(
        Arc::new(JsonTreeParser::new()),
        &canonical_project_path,
        threads,
        |msg| println!("{msg}"),
    )?;

    handle_statistics_output(&outcome.statistics, stats_output);
    Ok(outcome.statistics)
}
