//! Error types for the state store.

use thiserror::Error;

/// State store errors.
#[derive(Error, Debug)]
pub enum StateError {
    /// Failed to open or create the state database (S001).
    #[error("[S001] State database connection failed: {0}")]
    ConnectionError(String),

    /// Schema migration failed (S002).
    #[error("[S002] State database migration failed: {0}")]
    MigrationError(String),

    /// SQL execution error inside the state database (S003).
    #[error("[S003] State database query failed: {0}")]
    QueryError(String),

    /// Transaction management error (S004).
    #[error("[S004] State database transaction failed: {0}")]
    TransactionError(String),

    /// Another run holds the migration lock (S005).
    #[error(
        "[S005] A migration of {database}/{branch} is already in progress ({holder}, started {age_secs}s ago)"
    )]
    LockHeld {
        database: String,
        branch: String,
        holder: String,
        age_secs: i64,
    },

    /// A stored value could not be decoded (S006).
    #[error("[S006] Invalid value in state database: {0}")]
    InvalidRow(String),

    /// Connection mutex poisoned (S007).
    #[error("[S007] State database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for [`StateError`].
pub type StateResult<T> = Result<T, StateError>;
