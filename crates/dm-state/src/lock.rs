//! Advisory "migration in progress" lock.
//!
//! A run inserts a marker row for its `(database, branch)` before applying
//! anything. A second run finding a live marker refuses to start; a marker
//! older than the stale threshold is assumed to belong to a crashed run and
//! is replaced.

use crate::connection::{query_error, StateDb};
use crate::error::{StateError, StateResult};
use chrono::Utc;
use dm_core::{BranchName, DatabaseEngine};
use std::time::Duration;

/// Held lock; the marker row is removed when this guard is dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct RunLock<'a> {
    db: &'a StateDb,
    database: DatabaseEngine,
    branch: BranchName,
    holder: String,
}

impl RunLock<'_> {
    pub fn holder(&self) -> &str {
        &self.holder
    }

    fn release(&self) -> StateResult<()> {
        let conn = self.db.conn()?;
        conn.execute(
            "DELETE FROM dm_state.run_lock \
             WHERE database_engine = ? AND branch = ? AND holder = ?",
            duckdb::params![self.database.as_str(), self.branch.as_str(), self.holder],
        )
        .map_err(query_error)?;
        Ok(())
    }
}

impl Drop for RunLock<'_> {
    fn drop(&mut self) {
        match self.release() {
            Ok(()) => log::debug!(
                "Released migration lock for {}/{}",
                self.database,
                self.branch
            ),
            Err(e) => log::warn!(
                "Failed to release migration lock for {}/{}: {}",
                self.database,
                self.branch,
                e
            ),
        }
    }
}

impl StateDb {
    /// Take the migration lock for `(database, branch)`.
    pub fn acquire_lock(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
        holder: &str,
        stale_after: Duration,
    ) -> StateResult<RunLock<'_>> {
        let now = Utc::now().timestamp();
        let stale_secs = i64::try_from(stale_after.as_secs()).unwrap_or(i64::MAX);

        self.transaction(|conn| {
            let existing: Option<(String, i64)> = {
                let mut stmt = conn
                    .prepare(
                        "SELECT holder, acquired_epoch FROM dm_state.run_lock \
                         WHERE database_engine = ? AND branch = ?",
                    )
                    .map_err(query_error)?;
                let mut rows = stmt
                    .query(duckdb::params![database.as_str(), branch.as_str()])
                    .map_err(query_error)?;
                match rows.next().map_err(query_error)? {
                    Some(row) => Some((
                        row.get(0).map_err(query_error)?,
                        row.get(1).map_err(query_error)?,
                    )),
                    None => None,
                }
            };

            if let Some((current, acquired)) = existing {
                let age_secs = now.saturating_sub(acquired);
                if age_secs < stale_secs {
                    return Err(StateError::LockHeld {
                        database: database.to_string(),
                        branch: branch.to_string(),
                        holder: current,
                        age_secs,
                    });
                }
                log::warn!(
                    "Replacing stale migration lock for {}/{} held by {} for {}s",
                    database,
                    branch,
                    current,
                    age_secs
                );
                conn.execute(
                    "DELETE FROM dm_state.run_lock WHERE database_engine = ? AND branch = ?",
                    duckdb::params![database.as_str(), branch.as_str()],
                )
                .map_err(query_error)?;
            }

            conn.execute(
                "INSERT INTO dm_state.run_lock \
                 (database_engine, branch, holder, acquired_epoch) VALUES (?, ?, ?, ?)",
                duckdb::params![database.as_str(), branch.as_str(), holder, now],
            )
            .map_err(query_error)?;
            Ok(())
        })?;

        log::debug!("Acquired migration lock for {}/{}", database, branch);
        Ok(RunLock {
            db: self,
            database,
            branch: branch.clone(),
            holder: holder.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
