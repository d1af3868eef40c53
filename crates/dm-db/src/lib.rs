//! dm-db - Database execution layer for dbmorph
//!
//! This crate provides the `Database` trait the manager applies deltas
//! through, a DuckDB backend for local execution, and a script backend that
//! writes an engine-specific patch file instead of executing.

pub mod duckdb;
pub mod error;
pub mod script;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use script::ScriptBackend;
pub use traits::Database;
