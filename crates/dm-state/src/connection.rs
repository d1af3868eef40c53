//! State database connection and marker bookkeeping.

use crate::error::{StateError, StateResult};
use crate::migration::run_migrations;
use dm_core::{
    BranchName, CoreError, CoreResult, DatabaseEngine, Delta, DeltaId, Direction, VersionStore,
};
use duckdb::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// One row of the applied-delta history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub delta_id: DeltaId,
    pub direction: Direction,
    pub summary: String,
    pub statements: usize,
    /// `YYYY-MM-DD HH:MM:SS` in the store's clock
    pub applied_at: String,
}

/// DuckDB-backed persistence store.
///
/// The connection sits behind a mutex so the store can be shared as a
/// `&dyn VersionStore` across await points.
pub struct StateDb {
    conn: Mutex<Connection>,
}

impl StateDb {
    /// Open (or create) the state database at `path` and run pending migrations.
    pub fn open(path: &Path) -> StateResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StateError::ConnectionError(format!("{e}: {}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| StateError::ConnectionError(format!("{e}: {}", path.display())))?;
        Self::from_connection(conn)
    }

    /// In-memory store with all migrations applied.
    pub fn open_memory() -> StateResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StateError::ConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StateResult<Self> {
        let applied = run_migrations(&conn)?;
        if applied > 0 {
            log::debug!("State database migrated ({} migrations applied)", applied);
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> StateResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StateError::MutexPoisoned(e.to_string()))
    }

    /// Run `body` inside `BEGIN` / `COMMIT`, rolling back on error.
    pub(crate) fn transaction<F, T>(&self, body: F) -> StateResult<T>
    where
        F: FnOnce(&Connection) -> StateResult<T>,
    {
        let conn = self.conn()?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| StateError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&conn);
        match &result {
            Ok(_) => {
                if let Err(commit_err) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(StateError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    /// Highest applied schema migration
    pub fn schema_version(&self) -> StateResult<i32> {
        crate::migration::current_version(&*self.conn()?)
    }

    /// Last applied delta for `(database, branch)`
    pub fn last_applied_id(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
    ) -> StateResult<Option<DeltaId>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT delta_id FROM dm_state.last_applied \
                 WHERE database_engine = ? AND branch = ?",
            )
            .map_err(query_error)?;
        let mut rows = stmt
            .query(duckdb::params![database.as_str(), branch.as_str()])
            .map_err(query_error)?;

        match rows.next().map_err(query_error)? {
            Some(row) => {
                let raw: String = row.get(0).map_err(query_error)?;
                parse_id(&raw).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Move the marker to `delta` and append a history row, atomically
    pub fn record(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
        delta: &Delta,
    ) -> StateResult<()> {
        let id = delta.id().to_string();
        let statements = i64::try_from(delta.statements().len()).unwrap_or(i64::MAX);
        self.transaction(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO dm_state.last_applied \
                 (database_engine, branch, delta_id, applied_at) VALUES (?, ?, ?, now())",
                duckdb::params![database.as_str(), branch.as_str(), id],
            )
            .map_err(query_error)?;
            conn.execute(
                "INSERT INTO dm_state.history \
                 (database_engine, branch, delta_id, direction, summary, statements) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    database.as_str(),
                    branch.as_str(),
                    id,
                    delta.direction().as_str(),
                    delta.summary(),
                    statements
                ],
            )
            .map_err(query_error)?;
            Ok(())
        })
    }

    /// History rows for `(database, branch)` in application order
    pub fn history(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
    ) -> StateResult<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT delta_id, direction, summary, statements, \
                        strftime(applied_at, '%Y-%m-%d %H:%M:%S') \
                 FROM dm_state.history \
                 WHERE database_engine = ? AND branch = ? \
                 ORDER BY history_id",
            )
            .map_err(query_error)?;

        let raw_rows = stmt
            .query_map(duckdb::params![database.as_str(), branch.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        raw_rows
            .into_iter()
            .map(|(id, direction, summary, statements, applied_at)| {
                Ok(HistoryEntry {
                    delta_id: parse_id(&id)?,
                    direction: direction
                        .parse()
                        .map_err(|e: CoreError| StateError::InvalidRow(e.to_string()))?,
                    summary,
                    statements: usize::try_from(statements).unwrap_or(0),
                    applied_at,
                })
            })
            .collect()
    }
}

impl VersionStore for StateDb {
    fn last_applied(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
    ) -> CoreResult<Option<DeltaId>> {
        self.last_applied_id(database, branch)
            .map_err(|e| CoreError::VersionStore(e.to_string()))
    }

    fn record_applied(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
        delta: &Delta,
    ) -> CoreResult<()> {
        self.record(database, branch, delta)
            .map_err(|e| CoreError::VersionStore(e.to_string()))
    }
}

pub(crate) fn query_error(e: duckdb::Error) -> StateError {
    StateError::QueryError(e.to_string())
}

fn parse_id(raw: &str) -> StateResult<DeltaId> {
    DeltaId::parse(raw).map_err(|e| StateError::InvalidRow(e.to_string()))
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
