//! Plan command implementation - list the statements apply would execute

use anyhow::{Context, Result};
use hh_core::{SchemaDocument, Statement};
use serde::Serialize;

use crate::cli::{GlobalArgs, PlanArgs, PlanOutput};
use crate::commands::common;

/// Longest statement excerpt shown in table output
const SUMMARY_CHARS: usize = 72;

/// Statement entry for JSON output
#[derive(Debug, Serialize)]
struct PlannedStatement {
    index: usize,
    sql: String,
}

impl From<&Statement> for PlannedStatement {
    fn from(statement: &Statement) -> Self {
        Self {
            index: statement.index,
            sql: statement.sql(),
        }
    }
}

/// Execute the plan command
pub(crate) async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let settings = common::load_settings(global)?;
    let schema_path = common::resolve_schema_path(args.schema.as_deref(), &settings, global);
    common::verbose(global, &format!("Reading {}", schema_path.display()));

    let document = SchemaDocument::load(&schema_path).context("Failed to load schema")?;
    let statements = document.statements();

    match args.output {
        PlanOutput::Table => print_table(&statements),
        PlanOutput::Json => println!("{}", render_json(&statements)?),
    }
    Ok(())
}

fn print_table(statements: &[Statement]) {
    if statements.is_empty() {
        println!("No statements found.");
        return;
    }

    let width = statements.len().to_string().len();
    for statement in statements {
        println!(
            "{:>width$}  {}",
            statement.index,
            statement.summary(SUMMARY_CHARS),
            width = width
        );
    }
    println!("\n{} statements", statements.len());
}

fn render_json(statements: &[Statement]) -> Result<String> {
    let planned: Vec<PlannedStatement> = statements.iter().map(PlannedStatement::from).collect();
    serde_json::to_string_pretty(&planned).context("Failed to serialize plan")
}
