use super::*;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn branch(name: &str) -> BranchName {
    BranchName::parse(name).unwrap()
}

fn numbers(catalog: &DeltaCatalog) -> Vec<u64> {
    catalog.ids().filter_map(DeltaId::as_number).collect()
}

/// trunk: 10..=13 plus noise; release (forked at 12): its own 12 and 14
fn storage() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for id in 10..=13 {
        write(root, &format!("trunk/{id}.xml"), &format!("<delta id=\"{id}\"/>"));
    }
    write(root, "trunk/README.txt", "not a delta");
    write(root, "trunk/bad id.xml", "<delta/>");
    write(root, "trunk/billing/pkg.sql", "CREATE OR REPLACE PACKAGE billing AS END;");
    write(root, "release/12.xml", "<delta id=\"12\" branch=\"release\"/>");
    write(root, "release/14.xml", "<delta id=\"14\"/>");
    dir
}

fn release_provider() -> LocalDeltaProvider {
    let mut branches = BTreeMap::new();
    branches.insert(
        branch("release"),
        BranchConfig {
            parent: branch("trunk"),
            forked_at: DeltaId::Number(12),
        },
    );
    LocalDeltaProvider::new(DeltaFormat::Xml).with_branches(branches)
}

#[test]
fn test_connect_requires_existing_directory() {
    let dir = storage();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);

    let missing = dir.path().join("missing");
    let err = provider.connect(missing.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ProviderError::Unreachable { .. }));
    assert!(!provider.is_connected());

    let file = dir.path().join("trunk/10.xml");
    let err = provider.connect(file.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ProviderError::Unreachable { .. }));

    provider.connect(dir.path().to_str().unwrap()).unwrap();
    assert!(provider.is_connected());
    assert_eq!(provider.root(), Some(dir.path()));
    assert_eq!(provider.storage_engine(), StorageEngine::Local);
}

#[test]
fn test_resolve_uri() {
    assert_eq!(resolve_uri("file:///srv/deltas").unwrap(), PathBuf::from("/srv/deltas"));
    assert_eq!(
        resolve_uri("file://localhost/srv/deltas").unwrap(),
        PathBuf::from("/srv/deltas")
    );
    assert_eq!(resolve_uri(" deltas ").unwrap(), PathBuf::from("deltas"));
    assert!(matches!(
        resolve_uri("https://example.com/deltas"),
        Err(ProviderError::Unreachable { .. })
    ));
    assert!(resolve_uri("  ").is_err());
}

#[test]
fn test_enumerate_trunk() {
    let dir = storage();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    provider
        .connect(&format!("file://{}", dir.path().display()))
        .unwrap();

    let catalog = provider.available_deltas(&branch("trunk")).unwrap();
    assert_eq!(numbers(catalog), vec![10, 11, 12, 13]);
    assert!(provider.is_delta_available(&DeltaId::Number(11)));
    assert!(!provider.is_delta_available(&DeltaId::Number(14)));
}

#[test]
fn test_availability_fails_closed_before_enumeration() {
    let dir = storage();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    provider.connect(dir.path().to_str().unwrap()).unwrap();

    assert!(provider.catalog().is_none());
    assert!(!provider.is_delta_available(&DeltaId::Number(10)));
    assert!(matches!(
        provider.delta_content(&DeltaId::Number(10)),
        Err(ProviderError::NotFound { .. })
    ));
}

#[test]
fn test_enumerate_requires_connection() {
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    assert!(matches!(
        provider.available_deltas(&branch("trunk")),
        Err(ProviderError::NotConnected)
    ));
}

#[test]
fn test_branch_inheritance() {
    let dir = storage();
    let mut provider = release_provider();
    provider.connect(dir.path().to_str().unwrap()).unwrap();

    let catalog = provider.available_deltas(&branch("release")).unwrap();
    assert_eq!(numbers(catalog), vec![10, 11, 12, 14]);
    assert_eq!(catalog.get(&DeltaId::Number(12)).unwrap().branch, "release");
    assert_eq!(catalog.get(&DeltaId::Number(11)).unwrap().branch, "trunk");

    let own = provider.delta_content(&DeltaId::Number(12)).unwrap();
    assert!(String::from_utf8(own).unwrap().contains("branch=\"release\""));
    let inherited = provider.delta_content(&DeltaId::Number(10)).unwrap();
    assert_eq!(inherited, b"<delta id=\"10\"/>".to_vec());
}

#[test]
fn test_missing_branch_directory_is_empty() {
    let dir = storage();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    provider.connect(dir.path().to_str().unwrap()).unwrap();

    let catalog = provider.available_deltas(&branch("feature-x")).unwrap();
    assert!(catalog.is_empty());
}

#[test]
fn test_disconnect_is_idempotent_and_clears_state() {
    let dir = storage();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    provider.disconnect();

    provider.connect(dir.path().to_str().unwrap()).unwrap();
    provider.available_deltas(&branch("trunk")).unwrap();
    provider.disconnect();
    provider.disconnect();

    assert!(!provider.is_connected());
    assert!(provider.catalog().is_none());
    assert!(matches!(
        provider.delta_content(&DeltaId::Number(10)),
        Err(ProviderError::NotConnected)
    ));
}

#[test]
fn test_resource_content() {
    let dir = storage();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    provider.connect(dir.path().to_str().unwrap()).unwrap();
    provider.available_deltas(&branch("trunk")).unwrap();
    let id = DeltaId::Number(11);

    let head = provider.resource_content(&id, "billing/pkg.sql").unwrap();
    assert!(String::from_utf8(head).unwrap().starts_with("CREATE OR REPLACE PACKAGE"));

    assert!(matches!(
        provider.resource_content(&id, "billing/pkg_body.sql"),
        Err(ProviderError::ResourceNotFound { .. })
    ));
    assert!(matches!(
        provider.resource_content(&id, "../release/14.xml"),
        Err(ProviderError::InvalidResourcePath { .. })
    ));
    assert!(matches!(
        provider.resource_content(&id, "/etc/passwd"),
        Err(ProviderError::InvalidResourcePath { .. })
    ));
}

#[test]
fn test_branch_cycle_is_reported() {
    let dir = storage();
    let mut branches = BTreeMap::new();
    branches.insert(
        branch("a"),
        BranchConfig {
            parent: branch("b"),
            forked_at: DeltaId::Number(1),
        },
    );
    branches.insert(
        branch("b"),
        BranchConfig {
            parent: branch("a"),
            forked_at: DeltaId::Number(1),
        },
    );
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml).with_branches(branches);
    provider.connect(dir.path().to_str().unwrap()).unwrap();

    assert!(matches!(
        provider.available_deltas(&branch("a")),
        Err(ProviderError::Lineage(_))
    ));
}
