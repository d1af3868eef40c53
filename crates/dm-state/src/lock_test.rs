use super::*;
use std::time::Duration;

const FIVE_MINUTES: Duration = Duration::from_secs(300);

fn lock_rows(db: &StateDb) -> i64 {
    db.conn()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM dm_state.run_lock", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn lock_is_released_on_drop() {
    let db = StateDb::open_memory().unwrap();
    let trunk = BranchName::trunk();

    {
        let lock = db
            .acquire_lock(DatabaseEngine::Oracle, &trunk, "run-a", FIVE_MINUTES)
            .unwrap();
        assert_eq!(lock.holder(), "run-a");
        assert_eq!(lock_rows(&db), 1);
    }
    assert_eq!(lock_rows(&db), 0);
}

#[test]
fn live_lock_blocks_second_run() {
    let db = StateDb::open_memory().unwrap();
    let trunk = BranchName::trunk();

    let first = db
        .acquire_lock(DatabaseEngine::Oracle, &trunk, "run-a", FIVE_MINUTES)
        .unwrap();
    let err = db
        .acquire_lock(DatabaseEngine::Oracle, &trunk, "run-b", FIVE_MINUTES)
        .err()
        .unwrap();
    match err {
        StateError::LockHeld { holder, .. } => assert_eq!(holder, "run-a"),
        other => panic!("expected LockHeld, got {other}"),
    }

    drop(first);
    let _second = db
        .acquire_lock(DatabaseEngine::Oracle, &trunk, "run-b", FIVE_MINUTES)
        .unwrap();
}

#[test]
fn locks_are_scoped_by_database_and_branch() {
    let db = StateDb::open_memory().unwrap();
    let trunk = BranchName::trunk();
    let release = BranchName::parse("release").unwrap();

    let _a = db
        .acquire_lock(DatabaseEngine::Oracle, &trunk, "run-a", FIVE_MINUTES)
        .unwrap();
    let _b = db
        .acquire_lock(DatabaseEngine::Oracle, &release, "run-b", FIVE_MINUTES)
        .unwrap();
    let _c = db
        .acquire_lock(DatabaseEngine::MySql, &trunk, "run-c", FIVE_MINUTES)
        .unwrap();
    assert_eq!(lock_rows(&db), 3);
}

#[test]
fn stale_lock_is_replaced() {
    let db = StateDb::open_memory().unwrap();
    let trunk = BranchName::trunk();

    let crashed = db
        .acquire_lock(DatabaseEngine::MySql, &trunk, "crashed", FIVE_MINUTES)
        .unwrap();
    let fresh = db
        .acquire_lock(DatabaseEngine::MySql, &trunk, "fresh", Duration::ZERO)
        .unwrap();
    assert_eq!(lock_rows(&db), 1);

    // The replaced holder must not remove the new marker.
    drop(crashed);
    assert_eq!(lock_rows(&db), 1);
    drop(fresh);
    assert_eq!(lock_rows(&db), 0);
}
