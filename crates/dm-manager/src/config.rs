//! Run-level configuration for one resolve-then-apply cycle

use dm_core::{BranchConfig, BranchName, Config, DatabaseEngine, DeltaId, DeltaStorageConfig};
use std::collections::BTreeMap;

/// Resolved configuration the manager is constructed from.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Selects the delta variant and parser shape
    pub database: DatabaseEngine,

    /// Branch whose deltas are visible
    pub branch: BranchName,

    /// Where deltas are stored and in which format
    pub storage: DeltaStorageConfig,

    /// Branch inheritance used to build the available set
    pub branches: BTreeMap<BranchName, BranchConfig>,

    /// Lower bound; read from the version store when absent
    pub last_delta: Option<DeltaId>,

    /// Upper bound; the latest available id when absent
    pub target_delta: Option<DeltaId>,
}

impl ManagerConfig {
    pub fn new(database: DatabaseEngine, location: impl Into<String>) -> Self {
        Self {
            database,
            branch: BranchName::default(),
            storage: DeltaStorageConfig {
                location: location.into(),
                ..DeltaStorageConfig::default()
            },
            branches: BTreeMap::new(),
            last_delta: None,
            target_delta: None,
        }
    }

    /// Start from a project config; bounds are left unset
    pub fn from_project(config: &Config, database: DatabaseEngine) -> Self {
        Self {
            database,
            branch: config.branch.clone(),
            storage: config.delta_storage.clone(),
            branches: config.branches.clone(),
            last_delta: None,
            target_delta: None,
        }
    }

    pub fn with_branch(mut self, branch: BranchName) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_bounds(mut self, last: Option<DeltaId>, target: Option<DeltaId>) -> Self {
        self.last_delta = last;
        self.target_delta = target;
        self
    }
}
