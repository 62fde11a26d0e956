//! Apply command implementation - run the schema statements one by one

use anyhow::{Context, Result};
use hh_apply::{
    ApplyObserver, ApplyOptions, ApplySummary, SchemaApplier, StatementOutcome, StatementResult,
};
use hh_core::config::{resolve_credentials, ANON_KEY_VAR, SERVICE_KEY_VAR, URL_VAR};
use hh_core::{ApplyMode, CoreError, SchemaDocument, Settings, Statement};
use hh_db::{Database, RestBackend, RestOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{ApplyArgs, GlobalArgs};
use crate::commands::common::{self, ExitCode, EXIT_FATAL, EXIT_STATEMENT_FAILED};

/// Longest statement excerpt shown on a progress line
const SUMMARY_CHARS: usize = 60;

/// Execute the apply command
pub(crate) async fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    execute_with_env(args, global, |name| std::env::var(name).ok()).await
}

/// Execute the apply command, resolving credentials through `lookup`
pub(crate) async fn execute_with_env<F>(
    args: &ApplyArgs,
    global: &GlobalArgs,
    lookup: F,
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match run(args, global, lookup).await {
        Ok(run) => {
            print_summary(&run.summary, run.total);
            if run.summary.failed() > 0 {
                println!("\n❌ Schema application stopped ({} mode).", run.mode);
                common::print_manual_recovery(&run.schema_path);
                return Err(ExitCode(EXIT_STATEMENT_FAILED).into());
            }
            print_next_steps();
            Ok(())
        }
        Err(err) => {
            eprintln!("\n❌ Database setup failed: {:#}", err);
            if let Some(CoreError::MissingCredentials { .. }) = err.downcast_ref::<CoreError>() {
                eprintln!(
                    "   Set {} and {} (or {}) in .env.local or the environment.",
                    URL_VAR, SERVICE_KEY_VAR, ANON_KEY_VAR
                );
            }
            common::print_manual_recovery(&recovery_schema_path(args, global, &err));
            Err(ExitCode(EXIT_FATAL).into())
        }
    }
}

/// A completed pass over the schema
#[derive(Debug)]
pub(crate) struct ApplyRun {
    pub(crate) schema_path: PathBuf,
    pub(crate) mode: ApplyMode,
    pub(crate) total: usize,
    pub(crate) summary: ApplySummary,
}

/// Credentials, then settings and schema file, then the statement loop.
/// Any error returned here happened before the loop started.
pub(crate) async fn run<F>(args: &ApplyArgs, global: &GlobalArgs, lookup: F) -> Result<ApplyRun>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = resolve_credentials(lookup)?;
    if credentials.is_fallback_key() {
        println!(
            "⚠️  {} is not set; using {}. Schema changes may be rejected.",
            SERVICE_KEY_VAR, ANON_KEY_VAR
        );
    }
    common::verbose(global, &format!("Using endpoint {}", credentials.endpoint_url));

    let settings = common::load_settings(global)?;
    let options = apply_options(args, &settings);
    let timeout = args.timeout.or(settings.timeout_secs);
    if timeout == Some(0) {
        anyhow::bail!("--timeout must be greater than zero");
    }

    let schema_path = common::resolve_schema_path(args.schema.as_deref(), &settings, global);
    println!("🚀 Setting up database schema from {}", schema_path.display());

    let document = SchemaDocument::load(&schema_path).context("Failed to load schema")?;
    let statements = document.statements();
    println!("📄 Found {} SQL statements to execute\n", statements.len());

    let rest_options = RestOptions {
        rpc_function: settings.rpc_function.clone(),
        timeout: timeout.map(Duration::from_secs),
    };
    let backend = RestBackend::new(&credentials, rest_options)
        .context("Failed to configure database client")?;
    let db: Arc<dyn Database> = Arc::new(backend);
    common::verbose(
        global,
        &format!(
            "Executing via {} rpc '{}' in {} mode",
            db.db_type(),
            settings.rpc_function,
            options.mode
        ),
    );

    let mode = options.mode;
    let applier = SchemaApplier::new(db, options);
    let mut reporter = ConsoleReporter::new(statements.len(), global.verbose);
    let summary = applier.apply(&statements, &mut reporter).await;

    Ok(ApplyRun {
        schema_path,
        mode,
        total: statements.len(),
        summary,
    })
}

/// Merge CLI flags over settings
fn apply_options(args: &ApplyArgs, settings: &Settings) -> ApplyOptions {
    ApplyOptions {
        mode: if args.strict {
            ApplyMode::Strict
        } else {
            settings.mode
        },
        probe_table: args
            .probe_table
            .clone()
            .or_else(|| settings.probe_table.clone()),
    }
}

/// Best guess at the schema path when the run failed before resolving it.
///
/// Without credentials nothing may be read from disk, so the settings file
/// is skipped and the default schema path is used.
fn recovery_schema_path(
    args: &ApplyArgs,
    global: &GlobalArgs,
    err: &anyhow::Error,
) -> PathBuf {
    let settings = match err.downcast_ref::<CoreError>() {
        Some(CoreError::MissingCredentials { .. }) => Settings::default(),
        _ => common::load_settings(global).unwrap_or_default(),
    };
    common::resolve_schema_path(args.schema.as_deref(), &settings, global)
}

/// Prints one line per statement as the loop progresses
struct ConsoleReporter {
    total: usize,
    verbose: bool,
}

impl ConsoleReporter {
    fn new(total: usize, verbose: bool) -> Self {
        Self { total, verbose }
    }
}

impl ApplyObserver for ConsoleReporter {
    fn on_start(&mut self, statement: &Statement) {
        if self.verbose {
            eprintln!("[verbose] Statement {}:\n{}", statement.index, statement.sql());
        }
    }

    fn on_outcome(&mut self, statement: &Statement, result: &StatementResult) {
        println!("{}", format_outcome(statement, result, self.total));
    }
}

/// Progress line for one attempted statement
fn format_outcome(statement: &Statement, result: &StatementResult, total: usize) -> String {
    let position = format!("[{}/{}]", statement.index, total);
    let excerpt = statement.summary(SUMMARY_CHARS);
    match &result.outcome {
        StatementOutcome::Success => {
            format!("  ✅ {} {} ({}ms)", position, excerpt, result.duration.as_millis())
        }
        StatementOutcome::SkippedAlreadyExists => {
            format!("  ⚠️  {} {} (warning: already exists, skipped)", position, excerpt)
        }
        StatementOutcome::WarningLogged { message } => format!(
            "  ⚠️  {} Statement {} may have failed, continuing: {}",
            position, statement.index, message
        ),
        StatementOutcome::Failed { message } => {
            format!("  ❌ {} {} failed: {}", position, excerpt, message)
        }
    }
}

fn print_summary(summary: &ApplySummary, total: usize) {
    println!(
        "\n{} succeeded, {} skipped, {} warnings, {} failed ({} of {} statements attempted)",
        summary.succeeded(),
        summary.skipped(),
        summary.warnings(),
        summary.failed(),
        summary.attempted(),
        total,
    );
    println!("Total time: {}ms", summary.duration.as_millis());
}

fn print_next_steps() {
    println!("\n🎉 Database setup completed!");
    println!("\n📋 Next steps:");
    println!("   1. Check the Table Editor to confirm the tables were created");
    println!("   2. Review the row level security policies");
    println!("   3. Start the app and create a test account");
}

#[cfg(test)]
#[path = "apply_test.rs"]
mod tests;
