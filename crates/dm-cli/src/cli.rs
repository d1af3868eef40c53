//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use dm_core::{BranchName, DatabaseEngine, DeltaId, StorageEngine};

/// dbmorph - resolve and apply versioned database deltas
#[derive(Parser, Debug)]
#[command(name = "dm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the deltas between the last applied and the target delta
    Apply(ApplyArgs),

    /// Show the ordered range a run would apply, without reading any delta
    Plan(PlanArgs),

    /// Show the stored marker and the deltas pending up to the latest
    Status(StatusArgs),

    /// List deltas recorded for a database and branch
    History(HistoryArgs),
}

/// Which database, storage and branch a command works on
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Database engine (overrides `database` in dbmorph.yml)
    #[arg(short = 'd', long, value_enum, env = "DM_DATABASE")]
    pub database: Option<DatabaseArg>,

    /// Delta storage backend
    #[arg(long, value_enum)]
    pub delta_storage_engine: Option<StorageArg>,

    /// Delta storage root: a directory or a file:// URI
    #[arg(long, env = "DM_DELTA_STORAGE_LOCATION")]
    pub delta_storage_location: Option<String>,

    /// Branch to migrate along
    #[arg(short = 'b', long, value_parser = parse_branch)]
    pub branch: Option<BranchName>,
}

/// Range bounds; both default when omitted
#[derive(Args, Debug, Clone, Default)]
pub struct BoundArgs {
    /// Last applied delta (default: the stored marker)
    #[arg(long, value_parser = parse_delta_id)]
    pub last_delta: Option<DeltaId>,

    /// Delta to migrate to (default: the latest available)
    #[arg(long, value_parser = parse_delta_id)]
    pub target_delta: Option<DeltaId>,
}

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub bounds: BoundArgs,

    /// Execute against this DuckDB database instead of writing a patch script
    #[arg(short, long)]
    pub execute: Option<String>,

    /// Write the apply report as JSON to this path
    #[arg(long)]
    pub report_file: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub bounds: BoundArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show only the most recent N entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Database engines
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseArg {
    Oracle,
    Mysql,
}

impl From<DatabaseArg> for DatabaseEngine {
    fn from(arg: DatabaseArg) -> Self {
        match arg {
            DatabaseArg::Oracle => DatabaseEngine::Oracle,
            DatabaseArg::Mysql => DatabaseEngine::MySql,
        }
    }
}

/// Delta storage backends
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArg {
    /// Local filesystem
    Local,
}

impl From<StorageArg> for StorageEngine {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Local => StorageEngine::Local,
        }
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

fn parse_delta_id(value: &str) -> Result<DeltaId, String> {
    DeltaId::parse(value).map_err(|e| e.to_string())
}

fn parse_branch(value: &str) -> Result<BranchName, String> {
    BranchName::parse(value).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
