//! Error types for dm-core

use thiserror::Error;

/// Core error type for dbmorph
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Delta id could not be parsed
    #[error("[E004] Invalid delta id '{value}': {reason}")]
    InvalidDeltaId { value: String, reason: String },

    /// E005: Branch name could not be parsed
    #[error("[E005] Invalid branch name '{value}': {reason}")]
    InvalidBranchName { value: String, reason: String },

    /// E006: Unknown direction, engine, or storage keyword
    #[error("[E006] Unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownKeyword {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    /// E007: Version store read/write failure
    #[error("[E007] Version store failed: {0}")]
    VersionStore(String),

    /// E008: IO error
    #[error("[E008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E009: IO error with file path context
    #[error("[E009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E010: YAML parse error
    #[error("[E010] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
