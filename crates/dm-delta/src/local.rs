//! Filesystem delta provider
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<branch>/<id>.xml        one document per delta
//! <root>/<branch>/<name>/pkg.sql  companion files referenced by documents
//! ```

use crate::error::{ProviderError, ProviderResult};
use crate::provider::DeltaProvider;
use dm_core::{
    branch_lineage, AvailableDelta, BranchConfig, BranchName, Config, DeltaCatalog, DeltaFormat,
    DeltaId, StorageEngine,
};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Delta provider over a local directory tree
#[derive(Debug)]
pub struct LocalDeltaProvider {
    branches: BTreeMap<BranchName, BranchConfig>,
    format: DeltaFormat,
    root: Option<PathBuf>,
    catalog: Option<DeltaCatalog>,
    /// Document path of every catalog entry
    files: HashMap<DeltaId, PathBuf>,
}

impl LocalDeltaProvider {
    pub fn new(format: DeltaFormat) -> Self {
        Self {
            branches: BTreeMap::new(),
            format,
            root: None,
            catalog: None,
            files: HashMap::new(),
        }
    }

    /// Provider honouring the branch inheritance of a project config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.delta_storage.format).with_branches(config.branches.clone())
    }

    pub fn with_branches(mut self, branches: BTreeMap<BranchName, BranchConfig>) -> Self {
        self.branches = branches;
        self
    }

    /// Storage root while connected
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn require_root(&self) -> ProviderResult<&Path> {
        self.root.as_deref().ok_or(ProviderError::NotConnected)
    }

    fn document_path(&self, id: &DeltaId) -> ProviderResult<&Path> {
        self.require_root()?;
        self.files
            .get(id)
            .map(PathBuf::as_path)
            .ok_or_else(|| ProviderError::NotFound { id: id.clone() })
    }

    /// Documents in one branch directory, sorted by file name
    fn scan_branch(
        &self,
        root: &Path,
        branch: &BranchName,
    ) -> ProviderResult<Vec<(DeltaId, PathBuf)>> {
        let dir = root.join(branch.as_str());
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Branch directory {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(access_error(&dir, e)),
        };

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| access_error(&dir, e))?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(self.format.extension())
            {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match DeltaId::parse(stem) {
                Ok(id) => documents.push((id, path)),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(documents)
    }
}

impl DeltaProvider for LocalDeltaProvider {
    fn storage_engine(&self) -> StorageEngine {
        StorageEngine::Local
    }

    fn connect(&mut self, uri: &str) -> ProviderResult<()> {
        self.disconnect();
        let root = resolve_uri(uri)?;

        let unreachable = |reason: String| ProviderError::Unreachable {
            uri: uri.to_string(),
            reason,
        };
        let denied = |reason: String| ProviderError::Unauthorized {
            uri: uri.to_string(),
            reason,
        };

        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(unreachable("not a directory".to_string())),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(denied(e.to_string()))
            }
            Err(e) => return Err(unreachable(e.to_string())),
        }
        if let Err(e) = fs::read_dir(&root) {
            return Err(if e.kind() == ErrorKind::PermissionDenied {
                denied(e.to_string())
            } else {
                unreachable(e.to_string())
            });
        }

        log::debug!("Connected to local delta storage {}", root.display());
        self.root = Some(root);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.root.is_some()
    }

    fn disconnect(&mut self) {
        self.root = None;
        self.catalog = None;
        self.files.clear();
    }

    fn available_deltas(&mut self, branch: &BranchName) -> ProviderResult<&DeltaCatalog> {
        let root = self.require_root()?.to_path_buf();
        let lineage = branch_lineage(&self.branches, branch)?;

        let mut files: HashMap<DeltaId, PathBuf> = HashMap::new();
        let mut entries = Vec::new();
        for source in &lineage {
            for (id, path) in self.scan_branch(&root, &source.branch)? {
                if source.up_to.as_ref().is_some_and(|max| &id > max) {
                    continue;
                }
                if let Some(existing) = files.get(&id) {
                    log::debug!(
                        "Delta {} in {} shadowed by {}",
                        id,
                        path.display(),
                        existing.display()
                    );
                    continue;
                }
                entries.push(AvailableDelta {
                    id: id.clone(),
                    branch: source.branch.clone(),
                });
                files.insert(id, path);
            }
        }

        let catalog = DeltaCatalog::from_entries(entries);
        log::debug!(
            "Branch '{}' has {} available deltas across {} branch directories",
            branch,
            catalog.len(),
            lineage.len()
        );
        self.files = files;
        Ok(&*self.catalog.insert(catalog))
    }

    fn catalog(&self) -> Option<&DeltaCatalog> {
        self.catalog.as_ref()
    }

    fn delta_content(&self, id: &DeltaId) -> ProviderResult<Vec<u8>> {
        let path = self.document_path(id)?;
        log::debug!("Reading delta {} from {}", id, path.display());
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::NotFound { id: id.clone() },
            _ => access_error(path, e),
        })
    }

    fn resource_content(&self, id: &DeltaId, relative_path: &str) -> ProviderResult<Vec<u8>> {
        let document = self.document_path(id)?;
        let relative = validate_relative(relative_path)?;
        let path = document
            .parent()
            .map(|dir| dir.join(relative))
            .unwrap_or_else(|| relative.to_path_buf());

        log::debug!("Reading resource {} of delta {}", path.display(), id);
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::ResourceNotFound {
                id: id.clone(),
                path: relative_path.to_string(),
            },
            _ => access_error(&path, e),
        })
    }
}

/// Turn a storage location into a filesystem root.
///
/// Accepts plain paths and `file://` URIs; any other scheme is unreachable.
pub fn resolve_uri(uri: &str) -> ProviderResult<PathBuf> {
    let trimmed = uri.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Unreachable {
            uri: uri.to_string(),
            reason: "empty location".to_string(),
        });
    }
    if let Some(rest) = trimmed.strip_prefix("file://") {
        let rest = rest.strip_prefix("localhost").unwrap_or(rest);
        return Ok(PathBuf::from(rest));
    }
    if let Some((scheme, _)) = trimmed.split_once("://") {
        return Err(ProviderError::Unreachable {
            uri: uri.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        });
    }
    Ok(PathBuf::from(trimmed))
}

fn validate_relative(relative_path: &str) -> ProviderResult<&Path> {
    let invalid = |reason: &str| ProviderError::InvalidResourcePath {
        path: relative_path.to_string(),
        reason: reason.to_string(),
    };

    if relative_path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    let path = Path::new(relative_path);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("must be relative")),
        }
    }
    Ok(path)
}

fn access_error(path: &Path, source: std::io::Error) -> ProviderError {
    if source.kind() == ErrorKind::PermissionDenied {
        ProviderError::Unauthorized {
            uri: path.display().to_string(),
            reason: source.to_string(),
        }
    } else {
        ProviderError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
