//! Apply report for a single resolve-then-apply run
//!
//! The report is built incrementally by the manager, handed back on success
//! and attached to every error raised after resolution, so callers always see
//! which deltas were applied, which one failed and which were never attempted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::branch_name::BranchName;
use crate::config::DatabaseEngine;
use crate::delta::Delta;
use crate::delta_id::DeltaId;
use crate::direction::Direction;
use crate::error::CoreResult;

/// Outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Unique identifier for this run
    pub run_id: String,

    pub database: DatabaseEngine,

    pub branch: BranchName,

    /// `None` when the range is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,

    /// Resolved lower bound; `None` on a pristine database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_delta: Option<DeltaId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_delta: Option<DeltaId>,

    pub status: ApplyStatus,

    /// Deltas fully applied, in application order
    pub applied: Vec<AppliedDelta>,

    /// The delta the run stopped at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedDelta>,

    /// Deltas in the range that were not attempted
    pub pending: Vec<DeltaId>,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStatus {
    /// Empty range, nothing to do
    NoOp,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A delta that was applied and recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedDelta {
    pub id: DeltaId,
    pub summary: String,
    /// Number of statements executed
    pub statements: usize,
    pub applied_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// The delta at which a run stopped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDelta {
    pub id: DeltaId,
    pub direction: Direction,
    pub failed_at: DateTime<Utc>,
    pub error: String,
}

impl ApplyReport {
    /// Start a report for a run with resolved bounds
    pub fn new(
        database: DatabaseEngine,
        branch: BranchName,
        last_delta: Option<DeltaId>,
        target_delta: Option<DeltaId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            database,
            branch,
            direction: None,
            last_delta,
            target_delta,
            status: ApplyStatus::Running,
            applied: Vec::new(),
            failed: None,
            pending: Vec::new(),
            started_at: now,
            finished_at: None,
        }
    }

    /// Record the direction and the ordered range about to be applied
    pub fn begin(&mut self, direction: Direction, range: Vec<DeltaId>) {
        self.direction = Some(direction);
        self.pending = range;
    }

    /// Load a report from a file path
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let report: ApplyReport = serde_json::from_str(&content)?;
        Ok(Some(report))
    }

    /// Save the report atomically (temp file, then rename)
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Move a delta from pending to applied
    pub fn mark_applied(&mut self, delta: &Delta, statements: usize, duration_ms: u64) {
        self.pending.retain(|id| id != delta.id());
        self.applied.push(AppliedDelta {
            id: delta.id().clone(),
            summary: delta.summary().to_string(),
            statements,
            applied_at: Utc::now(),
            duration_ms,
        });
    }

    /// Move a delta from pending to failed and close the run
    pub fn mark_failed(&mut self, id: &DeltaId, direction: Direction, error: &str) {
        self.pending.retain(|p| p != id);
        self.failed = Some(FailedDelta {
            id: id.clone(),
            direction,
            failed_at: Utc::now(),
            error: error.to_string(),
        });
        self.finish(ApplyStatus::Failed);
    }

    pub fn mark_completed(&mut self) {
        let status = if self.applied.is_empty() && self.direction.is_none() {
            ApplyStatus::NoOp
        } else {
            ApplyStatus::Completed
        };
        self.finish(status);
    }

    pub fn mark_cancelled(&mut self) {
        self.finish(ApplyStatus::Cancelled);
    }

    fn finish(&mut self, status: ApplyStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Id of the last fully applied delta in this run
    pub fn last_applied(&self) -> Option<&DeltaId> {
        self.applied.last().map(|a| &a.id)
    }

    pub fn applied_ids(&self) -> Vec<DeltaId> {
        self.applied.iter().map(|a| a.id.clone()).collect()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ApplyStatus::NoOp | ApplyStatus::Completed)
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.applied.iter().map(|a| a.duration_ms).sum()
    }
}

impl std::fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyStatus::NoOp => write!(f, "no_op"),
            ApplyStatus::Running => write!(f, "running"),
            ApplyStatus::Completed => write!(f, "completed"),
            ApplyStatus::Failed => write!(f, "failed"),
            ApplyStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
