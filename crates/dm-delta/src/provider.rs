//! Delta provider contract

use crate::error::ProviderResult;
use dm_core::{BranchName, DeltaCatalog, DeltaId, StorageEngine};

/// Source of delta availability and raw content.
///
/// Lifecycle: `connect`, then `available_deltas` for the branch, then any
/// number of content fetches, then `disconnect`. Availability is answered
/// only from the loaded catalog; before it is loaded every id is unavailable.
pub trait DeltaProvider: Send {
    /// Storage backend this provider implements
    fn storage_engine(&self) -> StorageEngine;

    /// Acquire the storage connection for `uri`
    fn connect(&mut self, uri: &str) -> ProviderResult<()>;

    fn is_connected(&self) -> bool;

    /// Release the connection and drop the catalog. Never fails.
    fn disconnect(&mut self);

    /// Enumerate and cache the ids visible on `branch`
    fn available_deltas(&mut self, branch: &BranchName) -> ProviderResult<&DeltaCatalog>;

    /// The catalog loaded by the last `available_deltas` call
    fn catalog(&self) -> Option<&DeltaCatalog>;

    /// Membership test against the loaded catalog; false when none is loaded
    fn is_delta_available(&self, id: &DeltaId) -> bool {
        self.catalog().is_some_and(|catalog| catalog.contains(id))
    }

    /// Raw document bytes for `id`
    fn delta_content(&self, id: &DeltaId) -> ProviderResult<Vec<u8>>;

    /// Bytes of a companion file referenced by the document of `id`,
    /// relative to the directory that owns it
    fn resource_content(&self, id: &DeltaId, relative_path: &str) -> ProviderResult<Vec<u8>>;
}
