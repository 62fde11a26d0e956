//! HouseHelp schema CLI - apply a SQL schema through the backend's exec_sql procedure

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{apply, plan};

#[tokio::main]
async fn main() {
    load_env_files();
    let cli = Cli::parse();

    if let Err(err) = run(&cli).await {
        match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::exit(*code),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Apply(args) => apply::execute(args, &cli.global).await,
        cli::Commands::Plan(args) => plan::execute(args, &cli.global).await,
    }
}

/// Seed the environment from `.env.local` and `.env` in the working directory.
/// Variables that are already set win.
fn load_env_files() {
    for name in [".env.local", ".env"] {
        if let Err(e) = dotenvy::from_filename(name) {
            if !e.not_found() {
                eprintln!("Warning: could not load {}: {}", name, e);
            }
        }
    }
}
