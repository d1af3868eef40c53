//! Durable last-applied bookkeeping contract.

use crate::branch_name::BranchName;
use crate::config::DatabaseEngine;
use crate::delta::Delta;
use crate::delta_id::DeltaId;
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Persistence store mapping `(database, branch)` to the last applied id.
///
/// The manager reads it once to default a missing lower bound and writes it
/// after every fully applied delta.
pub trait VersionStore: Send + Sync {
    fn last_applied(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
    ) -> CoreResult<Option<DeltaId>>;

    fn record_applied(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
        delta: &Delta,
    ) -> CoreResult<()>;
}

/// Process-local store, used by script mode and tests.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    markers: Mutex<HashMap<(DatabaseEngine, BranchName), DeltaId>>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a marker, as if the delta had been applied earlier.
    pub fn with_marker(self, database: DatabaseEngine, branch: BranchName, id: DeltaId) -> Self {
        if let Ok(mut markers) = self.markers.lock() {
            markers.insert((database, branch), id);
        }
        self
    }
}

impl VersionStore for InMemoryVersionStore {
    fn last_applied(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
    ) -> CoreResult<Option<DeltaId>> {
        let markers = self
            .markers
            .lock()
            .map_err(|e| CoreError::VersionStore(format!("mutex poisoned: {e}")))?;
        Ok(markers.get(&(database, branch.clone())).cloned())
    }

    fn record_applied(
        &self,
        database: DatabaseEngine,
        branch: &BranchName,
        delta: &Delta,
    ) -> CoreResult<()> {
        let mut markers = self
            .markers
            .lock()
            .map_err(|e| CoreError::VersionStore(format!("mutex poisoned: {e}")))?;
        markers.insert((database, branch.clone()), delta.id().clone());
        Ok(())
    }
}
