//! Plan command implementation

use anyhow::Result;
use dm_core::InMemoryVersionStore;
use dm_manager::DeltaManager;

use crate::cli::{GlobalArgs, OutputFormat, PlanArgs};
use crate::commands::common::{print_json, print_plan, Project};

/// Execute the plan command
pub(crate) async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global, &args.target)?;
    let mut manager = DeltaManager::new(project.manager_config(&args.bounds));

    let plan = match project.open_existing_state()? {
        Some(state) => manager.plan(&state)?,
        None => manager.plan(&InMemoryVersionStore::new())?,
    };

    match args.output {
        OutputFormat::Text => print_plan(&plan),
        OutputFormat::Json => print_json(&plan)?,
    }
    Ok(())
}
