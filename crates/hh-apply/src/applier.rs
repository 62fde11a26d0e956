//! Sequential statement execution

use hh_core::{ApplyMode, Statement};
use hh_db::{Database, DbError, ErrorKind};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened to a single statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    /// Executed without error
    Success,

    /// The backend reported that the object already exists
    SkippedAlreadyExists,

    /// Execution failed; the run continued
    WarningLogged { message: String },

    /// Execution failed in strict mode; the run stopped here
    Failed { message: String },
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StatementOutcome::Success)
    }
}

/// Outcome of one attempted statement
#[derive(Debug, Clone)]
pub struct StatementResult {
    /// 1-based statement index
    pub index: usize,

    /// Outcome of the attempt
    pub outcome: StatementOutcome,

    /// Time spent on the statement, including any probe
    pub duration: Duration,
}

/// Summary of an apply run
#[derive(Debug, Clone)]
pub struct ApplySummary {
    /// One entry per attempted statement, in execution order
    pub results: Vec<StatementResult>,

    /// Total execution time
    pub duration: Duration,
}

impl ApplySummary {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Success))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::SkippedAlreadyExists))
    }

    pub fn warnings(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::WarningLogged { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Failed { .. }))
    }

    /// True when no statement produced a warning or failure
    pub fn is_clean(&self) -> bool {
        self.warnings() == 0 && self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&StatementOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Receives progress while the loop runs
pub trait ApplyObserver {
    /// Called before a statement is sent
    fn on_start(&mut self, _statement: &Statement) {}

    /// Called once per attempted statement
    fn on_outcome(&mut self, statement: &Statement, result: &StatementResult);
}

/// Observer that ignores all events
pub struct NoopObserver;

impl ApplyObserver for NoopObserver {
    fn on_outcome(&mut self, _statement: &Statement, _result: &StatementResult) {}
}

/// Options controlling failure handling
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Failure policy
    pub mode: ApplyMode,

    /// Sentinel table probed when an error carries no usable classification
    pub probe_table: Option<String>,
}

/// Applies schema statements one at a time
pub struct SchemaApplier {
    db: Arc<dyn Database>,
    options: ApplyOptions,
}

impl SchemaApplier {
    pub fn new(db: Arc<dyn Database>, options: ApplyOptions) -> Self {
        Self { db, options }
    }

    /// Execute every statement in order.
    ///
    /// Each call is awaited before the next one starts. In lenient mode all
    /// statements are attempted whatever happens; in strict mode the loop
    /// stops after the first failure that is not an "already exists" error.
    pub async fn apply(
        &self,
        statements: &[Statement],
        observer: &mut dyn ApplyObserver,
    ) -> ApplySummary {
        let start_time = Instant::now();
        let mut results = Vec::with_capacity(statements.len());

        log::debug!(
            "Applying {} statements via {} ({} mode)",
            statements.len(),
            self.db.db_type(),
            self.options.mode
        );

        for statement in statements {
            observer.on_start(statement);
            let stmt_start = Instant::now();

            let outcome = match self.db.execute_sql(&statement.sql()).await {
                Ok(()) => StatementOutcome::Success,
                Err(err) => self.classify_failure(statement, err).await,
            };

            let result = StatementResult {
                index: statement.index,
                outcome,
                duration: stmt_start.elapsed(),
            };
            observer.on_outcome(statement, &result);

            let stop = matches!(result.outcome, StatementOutcome::Failed { .. });
            results.push(result);
            if stop {
                log::debug!("Stopping after statement {} (strict mode)", statement.index);
                break;
            }
        }

        ApplySummary {
            results,
            duration: start_time.elapsed(),
        }
    }

    /// Turn a remote error into an outcome. Never propagates.
    async fn classify_failure(&self, statement: &Statement, err: DbError) -> StatementOutcome {
        log::debug!("Statement {} failed: {}", statement.index, err);

        match err.kind() {
            ErrorKind::AlreadyExists => return StatementOutcome::SkippedAlreadyExists,
            ErrorKind::NotFound | ErrorKind::Other => {}
        }

        if let Some(table) = &self.options.probe_table {
            match self.db.probe_table(table).await {
                Ok(()) => {}
                Err(probe_err) if probe_err.mentions_missing() => {
                    return StatementOutcome::SkippedAlreadyExists
                }
                Err(probe_err) => {
                    log::warn!(
                        "Probe of '{}' after statement {} failed: {}",
                        table,
                        statement.index,
                        probe_err
                    );
                    return self.failure(format!("{err} (probe: {probe_err})"));
                }
            }
        }

        self.failure(err.to_string())
    }

    fn failure(&self, message: String) -> StatementOutcome {
        match self.options.mode {
            ApplyMode::Lenient => StatementOutcome::WarningLogged { message },
            ApplyMode::Strict => StatementOutcome::Failed { message },
        }
    }
}

#[cfg(test)]
#[path = "applier_test.rs"]
mod tests;
