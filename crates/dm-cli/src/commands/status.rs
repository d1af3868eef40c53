//! Status command implementation

use anyhow::Result;
use dm_core::{BranchName, DatabaseEngine, DeltaId, InMemoryVersionStore, VersionStore};
use dm_manager::DeltaManager;
use serde::Serialize;

use crate::cli::{BoundArgs, GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{print_json, Project};

/// Marker and pending deltas for one database and branch
#[derive(Debug, Serialize)]
struct Status {
    database: DatabaseEngine,
    branch: BranchName,
    last_applied: Option<DeltaId>,
    latest: DeltaId,
    pending: Vec<DeltaId>,
}

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global, &args.target)?;
    let mut manager = DeltaManager::new(project.manager_config(&BoundArgs::default()));

    let state = project.open_existing_state()?;
    let memory = InMemoryVersionStore::new();
    let store: &dyn VersionStore = match &state {
        Some(state) => state,
        None => &memory,
    };
    let plan = manager.plan(store)?;

    let status = Status {
        database: project.database,
        branch: plan.branch.clone(),
        last_applied: plan.last_delta.clone(),
        latest: plan.target_delta.clone(),
        pending: plan.ids(),
    };

    match args.output {
        OutputFormat::Text => print_status(&status),
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

fn print_status(status: &Status) {
    let last = status
        .last_applied
        .as_ref()
        .map_or("<none>".to_string(), |id| id.to_string());
    println!("Database:     {}", status.database);
    println!("Branch:       {}", status.branch);
    println!("Last applied: {}", last);
    println!("Latest:       {}", status.latest);
    if status.pending.is_empty() {
        println!("Up to date");
    } else {
        let pending: Vec<String> = status.pending.iter().map(|id| id.to_string()).collect();
        println!("Pending ({}): {}", pending.len(), pending.join(", "));
    }
}
