use anyhow::Result;
use database::graph::GraphHandle;
use indexer::parsing::parser::JsonTreeParser;
use indexer::runner::run_project_indexer;
use querying::layers::LayerRules;
use querying::{QueryResult, QueryingService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct QueryArgs {
    pub project: PathBuf,
    pub query_or_file: String,
    pub threads: usize,
}

fn read_query(query_or_file: &str) -> Result<String> {
    let query = if Path::new(query_or_file).is_file() {
        std::fs::read_to_string(query_or_file)
            .map_err(|e| anyhow::anyhow!("Failed to read query file: {}", e))?
    } else {
        query_or_file.to_string()
    };

    let query = query.trim().to_string();
    if query.is_empty() {
        anyhow::bail!("Empty query provided");
    }
    Ok(query)
}

pub fn execute(args: &QueryArgs) -> Result<QueryResult> {
    let query = read_query(&args.query_or_file)?;
    let outcome = run_project_indexer(
        Arc::new(JsonTreeParser::new()),
        &args.project,
        args.threads,
        |_| {},
    )?;

    let service = QueryingService::new(
        Arc::new(GraphHandle::new(outcome.graph)),
        LayerRules::load(&args.project),
    );
    let result = service.query(&query)?;
    info!("Query matched {} results", result.total_results);
    Ok(result)
}

/// Print the result as JSON on stdout
pub fn run(args: QueryArgs) -> Result<()> {
    let result = execute(&args)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
