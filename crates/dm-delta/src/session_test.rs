use super::*;
use crate::local::LocalDeltaProvider;
use dm_core::{BranchName, DeltaFormat};
use tempfile::TempDir;

#[test]
fn test_session_disconnects_on_drop() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("trunk")).unwrap();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);

    {
        let mut session =
            ProviderSession::open(&mut provider, dir.path().to_str().unwrap()).unwrap();
        assert!(session.provider().is_connected());
        session
            .provider_mut()
            .available_deltas(&BranchName::trunk())
            .unwrap();
        assert!(session.provider().catalog().is_some());
    }

    assert!(!provider.is_connected());
    assert!(provider.catalog().is_none());
}

#[test]
fn test_failed_open_leaves_provider_disconnected() {
    let dir = TempDir::new().unwrap();
    let mut provider = LocalDeltaProvider::new(DeltaFormat::Xml);
    provider.connect(dir.path().to_str().unwrap()).unwrap();

    let missing = dir.path().join("missing");
    assert!(ProviderSession::open(&mut provider, missing.to_str().unwrap()).is_err());
    assert!(!provider.is_connected());
}
