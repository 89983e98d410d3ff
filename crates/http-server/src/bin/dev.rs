use anyhow::{Context, Result};
use http_server::{AppState, find_unused_port, run};
use logging::{LogMode, init};
use slice_manager::DataDirectory;
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let _guards = init(LogMode::Cli, true)?;

    let project_root = env::var("DEV_PROJECT")
        .map(PathBuf::from)
        .context("DEV_PROJECT must point at a directory of .tree.json files")?;

    let port = env::var("DEV_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .map_or_else(find_unused_port, Ok)?;

    let data_directory = DataDirectory::new_system_default()?;
    let (state, statistics) = AppState::for_project(project_root, &data_directory, 0, port)?;

    println!(
        "🚀 Development server starting on port {port} with {} nodes",
        statistics.node_count
    );

    run(state).await
}
