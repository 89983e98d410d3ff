use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ckg",
    version,
    about = "Code knowledge graph CLI",
    long_about = "Builds a symbol-resolved knowledge graph from resolved source trees and answers structural queries over it."
)]
pub struct CkgCli {
    #[command(subcommand)]
    pub command: Commands,
}

impl CkgCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the knowledge graph of a project and report what was found
    Index {
        /// Directory containing the project's `.tree.json` files
        #[arg(default_value = ".")]
        project_path: PathBuf,

        /// Number of worker threads (0 means auto-detect based on CPU cores)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Output statistics. Optionally specify a file path to save to.
        #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true)]
        stats: Option<Option<PathBuf>>,
    },
    /// Run a graph query such as `type:CLASS public:true` and print the result as JSON
    Query {
        /// Directory containing the project's `.tree.json` files
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Query string or file path containing the query
        #[arg(value_name = "QUERY_OR_FILE")]
        query_or_file: String,

        /// Number of worker threads (0 means auto-detect based on CPU cores)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },
    /// Serve the project's knowledge graph over HTTP
    Server {
        /// Directory containing the project's `.tree.json` files
        #[arg(default_value = ".")]
        project_path: PathBuf,

        /// Port to bind; a free one is picked when omitted
        #[arg(long)]
        port: Option<u16>,

        /// Number of worker threads (0 means auto-detect based on CPU cores)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,

        /// Log only to the rolling file, as JSON lines
        #[arg(long, default_value_t = false)]
        background: bool,

        /// Enable verbose logging
        #[arg(long)]
        verbose: bool,
    },
    /// Remove persisted slices and logs
    Clean,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_stats_flag_forms() {
        let cli = CkgCli::try_parse_from(["ckg", "index", "demo", "--stats"]).unwrap();
        match cli.command {
            Commands::Index { project_path, stats, threads, .. } => {
                assert_eq!(project_path, PathBuf::from("demo"));
                assert_eq!(stats, Some(None));
                assert_eq!(threads, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = CkgCli::try_parse_from(["ckg", "index", "--stats=out.json"]).unwrap();
        match cli.command {
            Commands::Index { stats, .. } => {
                assert_eq!(stats, Some(Some(PathBuf::from("out.json"))));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_server_defaults() {
        let cli = CkgCli::try_parse_from(["ckg", "server"]).unwrap();
        match cli.command {
            Commands::Server { project_path, port, background, .. } => {
                assert_eq!(project_path, PathBuf::from("."));
                assert_eq!(port, None);
                assert!(!background);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
