//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use dm_core::{ApplyReport, Config, CoreError, DatabaseEngine};
use dm_manager::{ManagerConfig, MigrationPlan};
use dm_state::StateDb;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::{BoundArgs, GlobalArgs, TargetArgs};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors (run lock, provider session) run first.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the failure was already printed.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Project configuration merged with command-line overrides
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub database: DatabaseEngine,
}

impl Project {
    /// Load `dbmorph.yml` (optional) and apply the flags on top of it
    pub(crate) fn load(global: &GlobalArgs, target: &TargetArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);
        let mut config = match &global.config {
            Some(path) => Config::load(Path::new(path))
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => match Config::load_from_dir(&root) {
                Ok(config) => config,
                Err(CoreError::ConfigNotFound { .. }) => {
                    log::debug!("No dbmorph.yml in {}, using flags only", root.display());
                    Config::default()
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context("Failed to load dbmorph.yml"))
                }
            },
        };

        apply_overrides(&mut config, target);
        config.validate().context("Invalid configuration")?;

        let Some(database) = config.database else {
            bail!("No database engine selected: pass --database or set `database` in dbmorph.yml");
        };
        config.delta_storage.location = storage_location(&root, &config.delta_storage.location);

        Ok(Self {
            root,
            config,
            database,
        })
    }

    pub(crate) fn manager_config(&self, bounds: &BoundArgs) -> ManagerConfig {
        ManagerConfig::from_project(&self.config, self.database).with_bounds(
            bounds.last_delta.clone(),
            bounds.target_delta.clone(),
        )
    }

    pub(crate) fn state_path(&self) -> PathBuf {
        self.config.state_path_absolute(&self.root)
    }

    /// Open (and migrate) the state database
    pub(crate) fn open_state(&self) -> Result<StateDb> {
        let path = self.state_path();
        StateDb::open(&path)
            .with_context(|| format!("Failed to open state database {}", path.display()))
    }

    /// Open the state database only if it was created by an earlier run
    pub(crate) fn open_existing_state(&self) -> Result<Option<StateDb>> {
        if self.state_path().exists() {
            self.open_state().map(Some)
        } else {
            Ok(None)
        }
    }
}

pub(crate) fn apply_overrides(config: &mut Config, target: &TargetArgs) {
    if let Some(database) = target.database {
        config.database = Some(database.into());
    }
    if let Some(engine) = target.delta_storage_engine {
        config.delta_storage.engine = engine.into();
    }
    if let Some(location) = &target.delta_storage_location {
        config.delta_storage.location = location.clone();
    }
    if let Some(branch) = &target.branch {
        config.branch = branch.clone();
    }
}

/// Relative storage paths are taken from the project root; URIs are kept
pub(crate) fn storage_location(root: &Path, location: &str) -> String {
    if location.contains("://") || Path::new(location).is_absolute() {
        location.to_string()
    } else {
        root.join(location).display().to_string()
    }
}

/// Print an apply report
pub(crate) fn print_report(report: &ApplyReport) {
    let direction = report
        .direction
        .map_or("-".to_string(), |d| d.to_string());
    println!(
        "Run {} [{}] {} on branch '{}': {}",
        report.run_id, report.database, direction, report.branch, report.status
    );
    for applied in &report.applied {
        println!(
            "  \u{2713} {:<12} {} ({} statements, {}ms)",
            applied.id.to_string(),
            applied.summary,
            applied.statements,
            applied.duration_ms
        );
    }
    if let Some(failed) = &report.failed {
        println!("  \u{2717} {:<12} {}", failed.id.to_string(), failed.error);
    }
    for pending in &report.pending {
        println!("  - {:<12} not attempted", pending.to_string());
    }
    println!();
    println!(
        "{} applied, {} pending, {}ms",
        report.applied.len(),
        report.pending.len(),
        report.total_duration_ms()
    );
}

/// Print a resolved plan
pub(crate) fn print_plan(plan: &MigrationPlan) {
    let last = plan
        .last_delta
        .as_ref()
        .map_or("<none>".to_string(), |id| id.to_string());
    match plan.direction {
        None => println!(
            "Branch '{}' is at {}, nothing to apply",
            plan.branch, plan.target_delta
        ),
        Some(direction) => {
            println!(
                "{} {} -> {} on branch '{}' ({} deltas)",
                direction,
                last,
                plan.target_delta,
                plan.branch,
                plan.steps.len()
            );
            for step in &plan.steps {
                println!("  {:>4}  {:<12} {}", step.order, step.id.to_string(), step.branch);
            }
        }
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
