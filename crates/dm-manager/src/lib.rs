//! dm-manager - Delta resolution and application engine for dbmorph
//!
//! Resolves the ordered, direction-aware range between the last applied
//! delta and a target, then drives provider and parser to materialise each
//! delta and applies it through the `Database` interface, recording progress
//! after every delta.

pub mod config;
pub mod error;
pub mod manager;
pub mod plan;

pub use config::ManagerConfig;
pub use error::{ApplyError, ManagerError, ResolutionError};
pub use manager::DeltaManager;
pub use plan::{resolve_plan, MigrationPlan, PlannedDelta};
