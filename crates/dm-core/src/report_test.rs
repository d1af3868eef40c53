use super::*;
use tempfile::tempdir;

fn ids(values: &[u64]) -> Vec<DeltaId> {
    values.iter().copied().map(DeltaId::Number).collect()
}

fn delta(id: u64) -> Delta {
    Delta::new(DeltaId::Number(id), 0, Direction::Up, DatabaseEngine::Oracle)
        .with_summary(format!("delta {id}"))
}

fn running_report() -> ApplyReport {
    let mut report = ApplyReport::new(
        DatabaseEngine::Oracle,
        BranchName::trunk(),
        Some(DeltaId::Number(4)),
        Some(DeltaId::Number(7)),
    );
    report.begin(Direction::Up, ids(&[5, 6, 7]));
    report
}

#[test]
fn test_new_report() {
    let report = ApplyReport::new(DatabaseEngine::MySql, BranchName::trunk(), None, None);
    assert_eq!(report.run_id.len(), 8);
    assert_eq!(report.status, ApplyStatus::Running);
    assert!(report.direction.is_none());
    assert!(report.applied.is_empty());
    assert!(report.finished_at.is_none());
}

#[test]
fn test_partial_failure_bookkeeping() {
    let mut report = running_report();
    report.mark_applied(&delta(5), 3, 12);
    report.mark_failed(&DeltaId::Number(6), Direction::Up, "ORA-00942");

    assert_eq!(report.status, ApplyStatus::Failed);
    assert_eq!(report.applied_ids(), ids(&[5]));
    assert_eq!(report.last_applied(), Some(&DeltaId::Number(5)));
    let failed = report.failed.as_ref().unwrap();
    assert_eq!(failed.id, DeltaId::Number(6));
    assert_eq!(failed.error, "ORA-00942");
    assert_eq!(report.pending, ids(&[7]));
    assert!(report.finished_at.is_some());
    assert!(!report.is_success());
}

#[test]
fn test_completed_run() {
    let mut report = running_report();
    for id in [5, 6, 7] {
        report.mark_applied(&delta(id), 1, 10);
    }
    report.mark_completed();

    assert_eq!(report.status, ApplyStatus::Completed);
    assert!(report.pending.is_empty());
    assert_eq!(report.total_duration_ms(), 30);
    assert!(report.is_success());
}

#[test]
fn test_empty_range_is_no_op() {
    let mut report = ApplyReport::new(
        DatabaseEngine::Oracle,
        BranchName::trunk(),
        Some(DeltaId::Number(9)),
        Some(DeltaId::Number(9)),
    );
    report.mark_completed();
    assert_eq!(report.status, ApplyStatus::NoOp);
    assert!(report.is_success());
}

#[test]
fn test_cancelled_run_keeps_pending() {
    let mut report = running_report();
    report.mark_applied(&delta(5), 1, 1);
    report.mark_cancelled();
    assert_eq!(report.status, ApplyStatus::Cancelled);
    assert_eq!(report.pending, ids(&[6, 7]));
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reports").join("apply.json");

    let mut report = running_report();
    report.mark_applied(&delta(5), 2, 4);
    report.save(&path).unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = ApplyReport::load(&path).unwrap().unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.applied_ids(), ids(&[5]));
    assert_eq!(loaded.direction, Some(Direction::Up));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let loaded = ApplyReport::load(&dir.path().join("nope.json")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_status_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&ApplyStatus::NoOp).unwrap(), "\"no_op\"");
    assert_eq!(ApplyStatus::Cancelled.to_string(), "cancelled");
}
