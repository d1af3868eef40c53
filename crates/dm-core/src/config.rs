//! Configuration types and parsing for dbmorph.yml

use crate::branch_name::BranchName;
use crate::delta_id::DeltaId;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Project configuration from dbmorph.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Target database engine; selects the delta variant and parser shape
    #[serde(default)]
    pub database: Option<DatabaseEngine>,

    /// Where and how deltas are stored
    #[serde(default)]
    pub delta_storage: DeltaStorageConfig,

    /// Branch to migrate along when none is given on the command line
    #[serde(default)]
    pub branch: BranchName,

    /// Branch inheritance, keyed by branch name
    #[serde(default)]
    pub branches: BTreeMap<BranchName, BranchConfig>,

    /// DuckDB file holding last-applied markers and history
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Directory that receives generated patch scripts
    #[serde(default = "default_script_dir")]
    pub script_dir: String,

    /// Advisory run lock settings
    #[serde(default)]
    pub lock: LockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            delta_storage: DeltaStorageConfig::default(),
            branch: BranchName::default(),
            branches: BTreeMap::new(),
            state_path: default_state_path(),
            script_dir: default_script_dir(),
            lock: LockConfig::default(),
        }
    }
}

/// Database engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    /// Oracle: packages (head + body) and DBMS_SCHEDULER jobs
    Oracle,
    /// MySQL: standalone stored functions
    MySql,
}

impl DatabaseEngine {
    /// Lowercase keyword used in config files, documents and the state store
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Oracle => "oracle",
            DatabaseEngine::MySql => "mysql",
        }
    }
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(DatabaseEngine::Oracle),
            "mysql" => Ok(DatabaseEngine::MySql),
            _ => Err(CoreError::UnknownKeyword {
                kind: "database engine",
                value: s.to_string(),
                expected: "oracle, mysql",
            }),
        }
    }
}

/// Delta storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngine {
    /// Local filesystem root (default)
    #[default]
    Local,
}

impl std::fmt::Display for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageEngine::Local => write!(f, "local"),
        }
    }
}

/// Serialized format of delta documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeltaFormat {
    /// One XML document per delta (default)
    #[default]
    Xml,
}

impl DeltaFormat {
    /// File extension of documents in this format
    pub fn extension(&self) -> &'static str {
        match self {
            DeltaFormat::Xml => "xml",
        }
    }
}

/// Delta storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeltaStorageConfig {
    /// Storage backend
    #[serde(default)]
    pub engine: StorageEngine,

    /// Root location: a path or a `file://` URI
    #[serde(default = "default_delta_location")]
    pub location: String,

    /// Document format
    #[serde(default)]
    pub format: DeltaFormat,
}

impl Default for DeltaStorageConfig {
    fn default() -> Self {
        Self {
            engine: StorageEngine::default(),
            location: default_delta_location(),
            format: DeltaFormat::default(),
        }
    }
}

/// Inheritance settings for one branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchConfig {
    /// Branch this one was cut from
    pub parent: BranchName,

    /// Last parent delta visible on this branch
    pub forked_at: DeltaId,
}

/// Advisory lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// Seconds after which a lock left behind by a crashed run is replaced
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

/// One hop in a branch's inheritance chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSource {
    /// Branch whose directory contributes deltas
    pub branch: BranchName,

    /// Upper bound (inclusive) on ids taken from this branch; `None` for the
    /// requested branch itself
    pub up_to: Option<DeltaId>,
}

const DEFAULT_STATE_PATH: &str = "target/dbmorph_state.duckdb";

const DEFAULT_SCRIPT_DIR: &str = "target";

fn default_state_path() -> String {
    DEFAULT_STATE_PATH.to_string()
}

fn default_script_dir() -> String {
    DEFAULT_SCRIPT_DIR.to_string()
}

fn default_delta_location() -> String {
    "deltas".to_string()
}

fn default_stale_after_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for dbmorph.yml or dbmorph.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("dbmorph.yml");
        let yaml_path = dir.join("dbmorph.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.delta_storage.location.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "delta_storage.location cannot be empty".to_string(),
            });
        }

        for branch in self.branches.keys() {
            self.branch_lineage(branch)?;
        }

        Ok(())
    }

    /// Resolve the chain of branches contributing deltas to `branch`.
    pub fn branch_lineage(&self, branch: &BranchName) -> CoreResult<Vec<BranchSource>> {
        branch_lineage(&self.branches, branch)
    }

    /// Absolute state database path relative to a project root
    pub fn state_path_absolute(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.state_path)
    }

    /// Absolute script directory relative to a project root
    pub fn script_dir_absolute(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.script_dir)
    }
}

/// Resolve the chain of branches contributing deltas to `branch`.
///
/// The first entry is `branch` itself (unbounded); each following entry is
/// an ancestor bounded by the `forked_at` of the child that inherits it.
pub fn branch_lineage(
    branches: &BTreeMap<BranchName, BranchConfig>,
    branch: &BranchName,
) -> CoreResult<Vec<BranchSource>> {
    let mut lineage = vec![BranchSource {
        branch: branch.clone(),
        up_to: None,
    }];
    let mut seen: HashSet<&BranchName> = HashSet::new();
    seen.insert(branch);

    let mut current = branch;
    let mut bound: Option<&DeltaId> = None;
    while let Some(cfg) = branches.get(current) {
        if !seen.insert(&cfg.parent) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "branch inheritance cycle: '{}' reaches '{}' again",
                    branch, cfg.parent
                ),
            });
        }
        // A grandparent is visible only up to the tighter of the two fork points.
        let effective = match bound {
            Some(b) if b < &cfg.forked_at => b,
            _ => &cfg.forked_at,
        };
        lineage.push(BranchSource {
            branch: cfg.parent.clone(),
            up_to: Some(effective.clone()),
        });
        bound = Some(effective);
        current = &cfg.parent;
    }

    Ok(lineage)
}

fn resolve_against(root: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
