use super::*;
use crate::cli::{DatabaseArg, StorageArg};
use dm_core::BranchName;
use tempfile::TempDir;

fn global(dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: dir.display().to_string(),
        config: None,
    }
}

#[test]
fn test_flags_alone_are_sufficient() {
    let dir = TempDir::new().unwrap();
    let target = TargetArgs {
        database: Some(DatabaseArg::Mysql),
        delta_storage_engine: Some(StorageArg::Local),
        delta_storage_location: Some("deltas".to_string()),
        branch: None,
    };

    let project = Project::load(&global(dir.path()), &target).unwrap();
    assert_eq!(project.database, DatabaseEngine::MySql);
    assert_eq!(
        project.config.delta_storage.location,
        dir.path().join("deltas").display().to_string()
    );
    assert_eq!(project.config.branch, BranchName::trunk());
}

#[test]
fn test_flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("dbmorph.yml"),
        "database: oracle\nbranch: release\ndelta_storage:\n  location: file:///srv/deltas\n",
    )
    .unwrap();
    let target = TargetArgs {
        database: Some(DatabaseArg::Mysql),
        ..TargetArgs::default()
    };

    let project = Project::load(&global(dir.path()), &target).unwrap();
    assert_eq!(project.database, DatabaseEngine::MySql);
    assert_eq!(project.config.branch, "release");
    assert_eq!(project.config.delta_storage.location, "file:///srv/deltas");
}

#[test]
fn test_missing_database_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = Project::load(&global(dir.path()), &TargetArgs::default())
        .err()
        .unwrap();
    assert!(err.to_string().contains("--database"));
}

#[test]
fn test_storage_location() {
    let root = Path::new("/work/app");
    assert_eq!(storage_location(root, "deltas"), "/work/app/deltas");
    assert_eq!(storage_location(root, "/srv/deltas"), "/srv/deltas");
    assert_eq!(storage_location(root, "file:///srv/deltas"), "file:///srv/deltas");
}

#[test]
fn test_existing_state_is_optional() {
    let dir = TempDir::new().unwrap();
    let target = TargetArgs {
        database: Some(DatabaseArg::Oracle),
        ..TargetArgs::default()
    };
    let project = Project::load(&global(dir.path()), &target).unwrap();
    assert!(project.open_existing_state().unwrap().is_none());
    assert!(!project.state_path().exists());
}
