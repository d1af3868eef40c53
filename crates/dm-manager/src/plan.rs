//! Range resolution.
//!
//! The range never includes the starting point and always includes the end
//! point, in both directions: from 10 up to 13 it is `[11, 12, 13]`, from 13
//! down to 10 it is `[12, 11, 10]`.

use crate::error::ResolutionError;
use dm_core::{BranchName, DeltaCatalog, DeltaId, Direction};
use serde::Serialize;

/// One delta scheduled for application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDelta {
    pub id: DeltaId,
    pub order: usize,
    /// Branch directory the delta is read from
    pub branch: BranchName,
}

/// Resolved bounds, direction and ordered range of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub branch: BranchName,
    /// `None` when the database has never been migrated
    pub last_delta: Option<DeltaId>,
    pub target_delta: DeltaId,
    /// `None` for an empty range
    pub direction: Option<Direction>,
    pub steps: Vec<PlannedDelta>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ids(&self) -> Vec<DeltaId> {
        self.steps.iter().map(|s| s.id.clone()).collect()
    }
}

/// Compute the ordered range between `last` and `target` on `branch`.
///
/// A missing `last` means a pristine database: every delta from the first
/// available one through `target` is applied upward. A missing `target`
/// means the latest available delta.
pub fn resolve_plan(
    catalog: &DeltaCatalog,
    branch: &BranchName,
    last: Option<&DeltaId>,
    target: Option<&DeltaId>,
) -> Result<MigrationPlan, ResolutionError> {
    if catalog.is_empty() {
        return Err(ResolutionError::EmptyProvider {
            branch: branch.clone(),
        });
    }
    let order_of = |id: &DeltaId| {
        catalog
            .order_of(id)
            .ok_or_else(|| ResolutionError::UnknownId {
                id: id.clone(),
                branch: branch.clone(),
            })
    };

    let last_order = last.map(order_of).transpose()?;
    let target_id = match (target, catalog.latest()) {
        (Some(id), _) | (None, Some(id)) => id,
        (None, None) => {
            return Err(ResolutionError::EmptyProvider {
                branch: branch.clone(),
            })
        }
    };
    let target_order = order_of(target_id)?;

    let entries = catalog.entries();
    let (direction, range): (Option<Direction>, Vec<usize>) = match last_order {
        None => (Some(Direction::Up), (0..=target_order).collect()),
        Some(last_order) => match Direction::between(&last_order, &target_order) {
            None => (None, Vec::new()),
            Some(Direction::Up) => (
                Some(Direction::Up),
                (last_order + 1..=target_order).collect(),
            ),
            Some(Direction::Down) => (
                Some(Direction::Down),
                (target_order..last_order).rev().collect(),
            ),
        },
    };

    Ok(MigrationPlan {
        branch: branch.clone(),
        last_delta: last.cloned(),
        target_delta: target_id.clone(),
        direction,
        steps: range
            .into_iter()
            .map(|order| PlannedDelta {
                id: entries[order].id.clone(),
                order,
                branch: entries[order].branch.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
