//! Error types for dm-delta

use dm_core::{CoreError, DatabaseEngine, DeltaId, Direction};
use thiserror::Error;

/// Provider connection and content errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// P001: Storage root missing or unsupported
    #[error("[P001] Delta storage '{uri}' is unreachable: {reason}")]
    Unreachable { uri: String, reason: String },

    /// P002: Storage root exists but cannot be read
    #[error("[P002] Access to delta storage '{uri}' denied: {reason}")]
    Unauthorized { uri: String, reason: String },

    /// P003: Content requested without a connection
    #[error("[P003] Delta provider is not connected")]
    NotConnected,

    /// P004: Id is not in the available set
    #[error("[P004] Delta '{id}' is not available")]
    NotFound { id: DeltaId },

    /// P005: Companion file referenced by a delta is missing
    #[error("[P005] Resource '{path}' of delta '{id}' not found")]
    ResourceNotFound { id: DeltaId, path: String },

    /// P006: Companion path escapes the branch directory
    #[error("[P006] Invalid resource path '{path}': {reason}")]
    InvalidResourcePath { path: String, reason: String },

    /// P007: Branch inheritance could not be resolved
    #[error("[P007] {0}")]
    Lineage(#[from] CoreError),

    /// P008: IO error with file path context
    #[error("[P008] Failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for ProviderError
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A delta's content could not be turned into a valid `Delta`
#[derive(Error, Debug)]
pub enum ParseError {
    /// X001: Content is not a well-formed delta document
    #[error("[X001] Delta '{id}' is malformed: {message}")]
    Malformed { id: DeltaId, message: String },

    /// X002: Document lacks the section for the requested direction
    #[error("[X002] Delta '{id}' has no '{direction}' section")]
    MissingDirection { id: DeltaId, direction: Direction },

    /// X003: Artifact does not fit the expected engine variant
    #[error("[X003] Delta '{id}' carries '{artifact}', which {engine} deltas do not support")]
    ShapeMismatch {
        id: DeltaId,
        engine: DatabaseEngine,
        artifact: String,
    },

    /// X004: Content or a companion file could not be fetched
    #[error("[X004] {0}")]
    Content(#[from] ProviderError),
}

/// Result type alias for ParseError
pub type ParseResult<T> = Result<T, ParseError>;
