//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use hh_core::Settings;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ExitCode is control flow; the command already printed its own message.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Exit code for setup failures (credentials, schema file, settings)
pub(crate) const EXIT_FATAL: i32 = 1;

/// Exit code for a statement failure in strict mode
pub(crate) const EXIT_STATEMENT_FAILED: i32 = 4;

/// Load settings from `--config` or the project directory
pub(crate) fn load_settings(global: &GlobalArgs) -> Result<Settings> {
    match &global.config {
        Some(path) => Settings::load(Path::new(path)).context("Failed to load settings file"),
        None => Settings::load_from_dir(Path::new(&global.project_dir))
            .context("Failed to load project settings"),
    }
}

/// Schema file to use: `--schema` as given, else `schema_path` under the project directory
pub(crate) fn resolve_schema_path(
    schema_arg: Option<&str>,
    settings: &Settings,
    global: &GlobalArgs,
) -> PathBuf {
    match schema_arg {
        Some(path) => PathBuf::from(path),
        None => settings.schema_path_absolute(Path::new(&global.project_dir)),
    }
}

/// Print verbose output if enabled
pub(crate) fn verbose(global: &GlobalArgs, msg: &str) {
    if global.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Print the manual fallback: run the schema by hand in the dashboard
pub(crate) fn print_manual_recovery(schema_path: &Path) {
    eprintln!();
    eprintln!("📋 Manual setup:");
    eprintln!("   1. Open your project dashboard and go to the SQL Editor");
    eprintln!("   2. Paste the contents of {}", schema_path.display());
    eprintln!("   3. Run the script and check the output for errors");
}
