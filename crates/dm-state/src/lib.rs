//! Persistence store for dbmorph.
//!
//! Provides a DuckDB-backed store at `target/dbmorph_state.duckdb` that
//! records the last applied delta per `(database, branch)`, keeps an
//! append-only history of applied deltas, and holds the advisory lock that
//! keeps two runs from racing on the same marker.

pub mod connection;
pub mod ddl;
pub mod error;
pub mod lock;
pub mod migration;

pub use connection::{HistoryEntry, StateDb};
pub use error::{StateError, StateResult};
pub use lock::RunLock;
