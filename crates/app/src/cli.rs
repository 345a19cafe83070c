use clap::Parser;
use repo_lookup_core::Scope;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "repo-lookup")]
#[command(about = "Enumerate repositories across one or more source-control servers")]
pub struct CliArgs {
    /// Catalog file describing the servers to query (overrides config)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Result scope: `repository` or `project` (overrides config)
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Walk the whole tree on the calling thread
    #[arg(long)]
    pub sync: bool,

    /// Maximum number of worker threads (overrides config)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Keep going when a server or collection fails
    #[arg(long)]
    pub best_effort: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
