//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Statement execution interface used to apply deltas.
///
/// The manager hands over one statement at a time, in delta order, and stops
/// at the first error. Implementations must be Send + Sync for async use.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single statement, returns affected rows where known
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute text that may hold several statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Annotate the output with a marker line (no-op for live databases)
    async fn comment(&self, _text: &str) -> DbResult<()> {
        Ok(())
    }

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Execute query returning row count (for tests)
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
