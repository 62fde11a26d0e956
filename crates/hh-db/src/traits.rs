//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Remote SQL execution surface used by the schema applier
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute one SQL statement through the remote procedure
    async fn execute_sql(&self, sql: &str) -> DbResult<()>;

    /// Read at most one row from `table`, discarding the result
    async fn probe_table(&self, table: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
