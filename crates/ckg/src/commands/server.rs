use anyhow::Result;
use http_server::AppState;
use slice_manager::DataDirectory;
use std::path::PathBuf;
use tracing::info;

use crate::utils::{
    ServerInfo, ServerLockInfo, is_server_running, remove_lock_file, write_lock_info,
};

pub struct ServerArgs {
    pub project_path: PathBuf,
    pub port: Option<u16>,
    pub threads: usize,
}

pub fn print_server_info(port: u16) -> Result<()> {
    let server_info = ServerInfo { port };
    println!("{}", serde_json::to_string(&server_info)?);
    Ok(())
}

pub async fn run(args: ServerArgs, data_directory: DataDirectory) -> Result<()> {
    if let Some(port) = is_server_running(&data_directory)? {
        // print server info to stdout for caller to allow connection
        print_server_info(port)?;
        return Ok(());
    }

    let port = match args.port {
        Some(port) => port,
        None => http_server::find_unused_port()?,
    };
    let project_root = args.project_path.canonicalize()?;
    let (state, statistics) =
        AppState::for_project(project_root, &data_directory, args.threads, port)?;
    info!(
        "Serving {} nodes from {}",
        statistics.node_count, statistics.project_path
    );

    write_lock_info(
        &data_directory,
        &ServerLockInfo {
            port,
            pid: Some(std::process::id()),
        },
    )?;
    print_server_info(port)?;

    let result = http_server::run(state).await;
    remove_lock_file(&data_directory)?;
    result
}
