//! dm-core - Core library for dbmorph
//!
//! This crate provides the delta data model, id ordering, branch names,
//! configuration parsing, the ordered delta catalog, run reports and the
//! version store contract shared by every dbmorph component.

pub mod branch_name;
pub mod catalog;
pub mod config;
pub mod delta;
pub mod delta_id;
pub mod direction;
pub mod error;
mod newtype_string;
pub mod report;
pub mod version_store;

pub use branch_name::{BranchName, DEFAULT_BRANCH};
pub use catalog::{AvailableDelta, DeltaCatalog};
pub use config::{
    branch_lineage, BranchConfig, BranchSource, Config, DatabaseEngine, DeltaFormat,
    DeltaStorageConfig, LockConfig, StorageEngine,
};
pub use delta::{Delta, EngineArtifacts, Package, SchedulerJob, StoredFunction};
pub use delta_id::DeltaId;
pub use direction::Direction;
pub use error::{CoreError, CoreResult};
pub use report::{AppliedDelta, ApplyReport, ApplyStatus, FailedDelta};
pub use version_store::{InMemoryVersionStore, VersionStore};
