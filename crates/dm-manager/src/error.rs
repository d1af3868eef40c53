//! Error types for dm-manager

use dm_core::{ApplyReport, BranchName, CoreError, DatabaseEngine, DeltaId, Direction};
use dm_delta::{ParseError, ProviderError};
use thiserror::Error;

/// The requested bounds cannot be resolved; raised before any content fetch
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// R001: A bound is not in the available set
    #[error("[R001] Delta '{id}' is not available on branch '{branch}'")]
    UnknownId { id: DeltaId, branch: BranchName },

    /// R002: The branch has no deltas at all
    #[error("[R002] No deltas are available on branch '{branch}'")]
    EmptyProvider { branch: BranchName },
}

/// Execution failure reported by the database interface
#[derive(Error, Debug)]
pub enum ApplyError {
    /// A001: A statement of the delta failed
    #[error("[A001] Statement {index} of delta '{id}' failed: {message}")]
    StatementFailed {
        id: DeltaId,
        index: usize,
        statement: String,
        message: String,
    },

    /// A002: The backend could not annotate its output
    #[error("[A002] Backend output for delta '{id}' failed: {message}")]
    Output { id: DeltaId, message: String },
}

/// Failure of a manager run.
///
/// Every variant raised after resolution carries the partial report, the
/// failing id and the direction, so a caller can retry from the last applied
/// delta.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Parser produces {parser} deltas but the run targets {database}")]
    EngineMismatch {
        parser: DatabaseEngine,
        database: DatabaseEngine,
    },

    #[error("Cannot connect to delta storage: {0}")]
    Connection(#[source] ProviderError),

    #[error("Cannot list deltas on branch '{branch}': {source}")]
    Catalog {
        branch: BranchName,
        source: ProviderError,
    },

    #[error("Cannot read the last applied delta: {0}")]
    Store(#[source] CoreError),

    #[error("Delta '{id}' ({direction}) could not be parsed: {source}")]
    Parse {
        id: DeltaId,
        direction: Direction,
        source: ParseError,
        report: Box<ApplyReport>,
    },

    #[error("Delta '{id}' ({direction}) failed to apply: {source}")]
    Apply {
        id: DeltaId,
        direction: Direction,
        source: ApplyError,
        report: Box<ApplyReport>,
    },

    #[error("Delta '{id}' ({direction}) was applied but could not be recorded: {source}")]
    Record {
        id: DeltaId,
        direction: Direction,
        source: CoreError,
        report: Box<ApplyReport>,
    },

    #[error("Run cancelled")]
    Cancelled { report: Box<ApplyReport> },
}

impl ManagerError {
    /// Partial report, for failures raised after resolution
    pub fn report(&self) -> Option<&ApplyReport> {
        match self {
            ManagerError::Parse { report, .. }
            | ManagerError::Apply { report, .. }
            | ManagerError::Record { report, .. }
            | ManagerError::Cancelled { report } => Some(report.as_ref()),
            ManagerError::Resolution(_)
            | ManagerError::EngineMismatch { .. }
            | ManagerError::Connection(_)
            | ManagerError::Catalog { .. }
            | ManagerError::Store(_) => None,
        }
    }

    /// The id and direction the run stopped at
    pub fn failed_delta(&self) -> Option<(&DeltaId, Direction)> {
        match self {
            ManagerError::Parse { id, direction, .. }
            | ManagerError::Apply { id, direction, .. }
            | ManagerError::Record { id, direction, .. } => Some((id, *direction)),
            _ => None,
        }
    }
}
