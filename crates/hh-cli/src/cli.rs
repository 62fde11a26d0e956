//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// HouseHelp schema tool - apply supabase-schema.sql to the hosted database
#[derive(Parser, Debug)]
#[command(name = "hh")]
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

    /// Override settings file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the schema statements against the database
    Apply(ApplyArgs),

    /// List the statements apply would execute, without connecting
    Plan(PlanArgs),
}

/// Arguments for the apply command
#[derive(Args, Debug, Default)]
pub struct ApplyArgs {
    /// Schema file (default: schema_path from settings)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Stop at the first statement that fails for a reason other than "already exists"
    #[arg(long)]
    pub strict: bool,

    /// Sentinel table probed to classify errors the backend leaves uncoded
    #[arg(long)]
    pub probe_table: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Schema file (default: schema_path from settings)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: PlanOutput,
}

/// Plan output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutput {
    /// One line per statement
    Table,
    /// JSON array of statements
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
