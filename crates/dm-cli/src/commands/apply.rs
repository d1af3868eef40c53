//! Apply command implementation

use anyhow::{Context, Result};
use dm_core::{ApplyReport, InMemoryVersionStore, VersionStore};
use dm_db::{Database, DuckDbBackend, ScriptBackend};
use dm_manager::{DeltaManager, ManagerError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{ApplyArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{print_json, print_report, ExitCode, Project};

/// Execute the apply command
pub(crate) async fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global, &args.target)?;

    let cancel = Arc::new(AtomicBool::new(false));
    cancel_on_ctrl_c(cancel.clone());
    let mut manager =
        DeltaManager::new(project.manager_config(&args.bounds)).with_cancellation(cancel);

    let outcome = match &args.execute {
        Some(db_path) => apply_live(&project, &mut manager, db_path).await?,
        None => write_script(&project, &mut manager, args.output).await?,
    };

    match outcome {
        Ok(report) => {
            emit(args, &report)?;
            Ok(())
        }
        Err(err) => {
            if let Some(report) = err.report() {
                emit(args, report)?;
                eprintln!("Error: {}", err);
                return Err(ExitCode(1).into());
            }
            Err(err.into())
        }
    }
}

/// Execute against DuckDB, recording progress in the state database
async fn apply_live(
    project: &Project,
    manager: &mut DeltaManager,
    db_path: &str,
) -> Result<Result<ApplyReport, ManagerError>> {
    let db = DuckDbBackend::new(db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    let state = project.open_state()?;

    let holder = format!("dm-{}", std::process::id());
    let _lock = state
        .acquire_lock(
            project.database,
            &project.config.branch,
            &holder,
            Duration::from_secs(project.config.lock.stale_after_secs),
        )
        .context("Failed to acquire run lock")?;

    Ok(manager.run(&db, &state).await)
}

/// Write a patch script; the state database is read but never written
async fn write_script(
    project: &Project,
    manager: &mut DeltaManager,
    output: OutputFormat,
) -> Result<Result<ApplyReport, ManagerError>> {
    let store = seeded_store(project)?;
    let path = script_path(project);
    let script = ScriptBackend::create(&path, project.database)
        .with_context(|| format!("Failed to create script {}", path.display()))?;

    let outcome = manager.run(&script, &store).await;
    script.finish()?;

    match &outcome {
        Ok(report) if report.applied.is_empty() => {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(_) => {
            let instructions = format!(
                "Patch script written to {} ({} statements)\nRun it with: {}",
                script.path().display(),
                script.statement_count(),
                script.run_instructions()
            );
            match output {
                OutputFormat::Text => println!("{}\n", instructions),
                OutputFormat::Json => log::info!("{}", instructions),
            }
        }
        Err(_) => log::warn!(
            "Partial patch script left at {} ({})",
            script.path().display(),
            script.db_type()
        ),
    }
    Ok(outcome)
}

/// In-memory store starting from the recorded marker, if any
fn seeded_store(project: &Project) -> Result<InMemoryVersionStore> {
    let store = InMemoryVersionStore::new();
    let Some(state) = project.open_existing_state()? else {
        return Ok(store);
    };
    Ok(
        match state.last_applied(project.database, &project.config.branch)? {
            Some(id) => store.with_marker(project.database, project.config.branch.clone(), id),
            None => store,
        },
    )
}

fn script_path(project: &Project) -> PathBuf {
    project.config.script_dir_absolute(&project.root).join(format!(
        "patch_{}_{}.sql",
        project.database, project.config.branch
    ))
}

fn emit(args: &ApplyArgs, report: &ApplyReport) -> Result<()> {
    if let Some(path) = &args.report_file {
        report
            .save(Path::new(path))
            .with_context(|| format!("Failed to write report {}", path))?;
    }
    match args.output {
        OutputFormat::Text => print_report(report),
        OutputFormat::Json => print_json(report)?,
    }
    Ok(())
}

/// Stop before the next delta on Ctrl-C; the current delta always finishes
fn cancel_on_ctrl_c(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current delta");
            flag.store(true, Ordering::SeqCst);
        }
    });
}
