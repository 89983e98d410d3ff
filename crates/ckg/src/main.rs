mod cli;
mod commands;
mod utils;

use crate::cli::{CkgCli, Commands};
use crate::commands::{query::QueryArgs, server::ServerArgs};
use anyhow::Result;
use logging::LogMode;
use mimalloc::MiMalloc;
use slice_manager::DataDirectory;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CkgCli::parse_args();

    match cli.command {
        Commands::Index {
            project_path,
            threads,
            verbose,
            stats,
        } => {
            let _guards = logging::init(LogMode::Cli, verbose)?;
            commands::index::run(project_path, threads, stats)?;
            Ok(())
        }
        Commands::Query {
            project,
            query_or_file,
            threads,
        } => {
            // stdout carries the JSON result
            let _guards = logging::init(LogMode::DataStdout, false)?;
            commands::query::run(QueryArgs {
                project,
                query_or_file,
                threads,
            })
        }
        Commands::Server {
            project_path,
            port,
            threads,
            background,
            verbose,
        } => {
            let mode = if background {
                LogMode::ServerBackground
            } else {
                LogMode::ServerForeground
            };
            let _guards = logging::init(mode, verbose)?;
            let data_directory = DataDirectory::new_system_default()?;
            commands::server::run(
                ServerArgs {
                    project_path,
                    port,
                    threads,
                },
                data_directory,
            )
            .await
        }
        Commands::Clean => {
            let _guards = logging::init(LogMode::Cli, false)?;
            let data_directory = DataDirectory::new_system_default()?;
            commands::clean::run(&data_directory).map(|_| ())
        }
    }
}
