use super::*;
use dm_core::AvailableDelta;

fn catalog(ids: &[u64]) -> DeltaCatalog {
    DeltaCatalog::from_entries(ids.iter().map(|&id| AvailableDelta {
        id: DeltaId::Number(id),
        branch: BranchName::trunk(),
    }))
}

fn n(id: u64) -> DeltaId {
    DeltaId::Number(id)
}

fn numbers(plan: &MigrationPlan) -> Vec<u64> {
    plan.steps.iter().filter_map(|s| s.id.as_number()).collect()
}

fn resolve(
    ids: &[u64],
    last: Option<u64>,
    target: Option<u64>,
) -> Result<MigrationPlan, ResolutionError> {
    resolve_plan(
        &catalog(ids),
        &BranchName::trunk(),
        last.map(n).as_ref(),
        target.map(n).as_ref(),
    )
}

#[test]
fn test_up_excludes_last_includes_target() {
    let plan = resolve(&[10, 11, 12, 13], Some(10), Some(13)).unwrap();
    assert_eq!(plan.direction, Some(Direction::Up));
    assert_eq!(numbers(&plan), vec![11, 12, 13]);
    assert_eq!(plan.steps[0].order, 1);
}

#[test]
fn test_down_excludes_last_includes_target() {
    let plan = resolve(&[10, 11, 12, 13], Some(13), Some(10)).unwrap();
    assert_eq!(plan.direction, Some(Direction::Down));
    assert_eq!(numbers(&plan), vec![12, 11, 10]);
}

#[test]
fn test_every_pair_follows_the_range_rule() {
    let ids = [1, 2, 3, 5, 8, 13];
    for &last in &ids {
        for &target in &ids {
            let plan = resolve(&ids, Some(last), Some(target)).unwrap();
            let got = numbers(&plan);
            let expected: Vec<u64> = if last < target {
                ids.iter().copied().filter(|&i| i > last && i <= target).collect()
            } else {
                ids.iter()
                    .rev()
                    .copied()
                    .filter(|&i| i < last && i >= target)
                    .collect()
            };
            assert_eq!(got, expected, "last={last} target={target}");
            assert_eq!(plan.direction.is_none(), last == target);
        }
    }
}

#[test]
fn test_equal_bounds_is_empty() {
    let plan = resolve(&[10, 11], Some(11), Some(11)).unwrap();
    assert!(plan.is_empty());
    assert_eq!(plan.direction, None);
}

#[test]
fn test_gaps_are_not_errors() {
    let plan = resolve(&[10, 12, 15], Some(10), Some(15)).unwrap();
    assert_eq!(numbers(&plan), vec![12, 15]);
}

#[test]
fn test_unknown_bounds() {
    let err = resolve(&[10, 11], Some(9), Some(11)).unwrap_err();
    assert!(matches!(err, ResolutionError::UnknownId { ref id, .. } if *id == n(9)));

    let err = resolve(&[10, 11], Some(10), Some(12)).unwrap_err();
    assert!(matches!(err, ResolutionError::UnknownId { ref id, .. } if *id == n(12)));
}

#[test]
fn test_empty_catalog() {
    let err = resolve(&[], Some(1), Some(2)).unwrap_err();
    assert!(matches!(err, ResolutionError::EmptyProvider { .. }));
}

#[test]
fn test_pristine_database_applies_from_first() {
    let plan = resolve(&[10, 11, 12], None, Some(11)).unwrap();
    assert_eq!(plan.direction, Some(Direction::Up));
    assert_eq!(plan.last_delta, None);
    assert_eq!(numbers(&plan), vec![10, 11]);
}

#[test]
fn test_missing_target_means_latest() {
    let plan = resolve(&[10, 11, 12], Some(10), None).unwrap();
    assert_eq!(plan.target_delta, n(12));
    assert_eq!(numbers(&plan), vec![11, 12]);
}

#[test]
fn test_labels_order_after_numbers() {
    let catalog = DeltaCatalog::from_entries(
        ["2", "10", "r1.0", "r1.1"].iter().map(|raw| AvailableDelta {
            id: DeltaId::parse(raw).unwrap(),
            branch: BranchName::trunk(),
        }),
    );
    let plan = resolve_plan(
        &catalog,
        &BranchName::trunk(),
        Some(&n(2)),
        Some(&DeltaId::parse("r1.1").unwrap()),
    )
    .unwrap();
    assert_eq!(
        plan.ids(),
        vec![
            n(10),
            DeltaId::Label("r1.0".to_string()),
            DeltaId::Label("r1.1".to_string())
        ]
    );
}
