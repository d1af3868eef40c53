//! Ordered set of deltas visible on a branch.

use crate::branch_name::BranchName;
use crate::delta_id::DeltaId;
use serde::Serialize;
use std::collections::BTreeMap;

/// One id visible on a branch, with the branch whose directory owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableDelta {
    pub id: DeltaId,
    pub branch: BranchName,
}

/// Ids available on a branch, sorted by their natural order.
///
/// The position of an entry is the `order` of the delta it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeltaCatalog {
    entries: Vec<AvailableDelta>,
}

impl DeltaCatalog {
    /// Build a catalog from unsorted entries.
    ///
    /// When an id occurs more than once the first occurrence is kept, so
    /// callers list a branch's own deltas before inherited ones.
    pub fn from_entries(entries: impl IntoIterator<Item = AvailableDelta>) -> Self {
        let mut by_id: BTreeMap<DeltaId, BranchName> = BTreeMap::new();
        for entry in entries {
            by_id.entry(entry.id).or_insert(entry.branch);
        }
        Self {
            entries: by_id
                .into_iter()
                .map(|(id, branch)| AvailableDelta { id, branch })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &DeltaId) -> bool {
        self.order_of(id).is_some()
    }

    /// Position of `id` in the catalog
    pub fn order_of(&self, id: &DeltaId) -> Option<usize> {
        self.entries.binary_search_by(|e| e.id.cmp(id)).ok()
    }

    pub fn get(&self, id: &DeltaId) -> Option<&AvailableDelta> {
        self.order_of(id).map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &[AvailableDelta] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &DeltaId> {
        self.entries.iter().map(|e| &e.id)
    }

    pub fn first(&self) -> Option<&DeltaId> {
        self.entries.first().map(|e| &e.id)
    }

    /// Highest available id
    pub fn latest(&self) -> Option<&DeltaId> {
        self.entries.last().map(|e| &e.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, branch: &str) -> AvailableDelta {
        AvailableDelta {
            id: DeltaId::Number(id),
            branch: BranchName::parse(branch).unwrap(),
        }
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let catalog = DeltaCatalog::from_entries(vec![
            entry(12, "trunk"),
            entry(10, "trunk"),
            entry(13, "trunk"),
            entry(11, "trunk"),
        ]);
        let ids: Vec<u64> = catalog.ids().filter_map(DeltaId::as_number).collect();
        assert_eq!(ids, vec![10, 11, 12, 13]);
        assert_eq!(catalog.order_of(&DeltaId::Number(12)), Some(2));
        assert_eq!(catalog.first(), Some(&DeltaId::Number(10)));
        assert_eq!(catalog.latest(), Some(&DeltaId::Number(13)));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let catalog =
            DeltaCatalog::from_entries(vec![entry(5, "release"), entry(5, "trunk"), entry(4, "trunk")]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(&DeltaId::Number(5)).unwrap().branch, "release");
    }

    #[test]
    fn test_membership() {
        let catalog = DeltaCatalog::from_entries(vec![entry(1, "trunk"), entry(3, "trunk")]);
        assert!(catalog.contains(&DeltaId::Number(3)));
        assert!(!catalog.contains(&DeltaId::Number(2)));
        assert!(catalog.get(&DeltaId::Number(2)).is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = DeltaCatalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.latest(), None);
    }
}
