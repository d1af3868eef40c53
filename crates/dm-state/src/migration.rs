//! Schema migrations for the state database.
//!
//! Applied versions live in `dm_state.schema_version`. Opening a store brings
//! its schema up to the newest embedded migration; each migration and its
//! version row commit together.

use crate::ddl::{Migration, MIGRATIONS};
use crate::error::{StateError, StateResult};
use duckdb::Connection;

const VERSION_TABLE: &str = "CREATE SCHEMA IF NOT EXISTS dm_state;
CREATE TABLE IF NOT EXISTS dm_state.schema_version (
    version    INTEGER   NOT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT now()
);";

/// Highest applied migration version, or 0 on a fresh database.
pub fn current_version(conn: &Connection) -> StateResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM dm_state.schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| StateError::MigrationError(format!("cannot read schema version: {e}")))
}

/// Apply every migration newer than the recorded version.
///
/// Returns how many migrations were applied.
pub fn run_migrations(conn: &Connection) -> StateResult<usize> {
    conn.execute_batch(VERSION_TABLE)
        .map_err(|e| StateError::MigrationError(format!("cannot create schema_version: {e}")))?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    for migration in &pending {
        apply(conn, migration)?;
    }
    Ok(pending.len())
}

fn apply(conn: &Connection, migration: &Migration) -> StateResult<()> {
    log::debug!("Applying state migration v{:03}", migration.version);
    let failed = |e: duckdb::Error| {
        StateError::MigrationError(format!("v{:03}: {e}", migration.version))
    };

    conn.execute_batch("BEGIN TRANSACTION").map_err(failed)?;
    let result = conn.execute_batch(migration.sql).and_then(|()| {
        conn.execute(
            "INSERT INTO dm_state.schema_version (version) VALUES (?)",
            duckdb::params![migration.version],
        )
    });
    match result {
        Ok(_) => conn.execute_batch("COMMIT").map_err(failed),
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(failed(e))
        }
    }
}
