//! History command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, HistoryArgs, OutputFormat};
use crate::commands::common::{print_json, Project};

/// Execute the history command
pub(crate) async fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global, &args.target)?;

    let mut entries = match project.open_existing_state()? {
        Some(state) => state
            .history(project.database, &project.config.branch)
            .context("Failed to read history")?,
        None => Vec::new(),
    };
    if let Some(limit) = args.limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }

    if args.output == OutputFormat::Json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!(
            "No deltas recorded for {} on branch '{}'",
            project.database, project.config.branch
        );
        return Ok(());
    }

    println!(
        "{:<20} {:<5} {:<12} {:>5}  SUMMARY",
        "APPLIED AT", "DIR", "DELTA", "STMTS"
    );
    for entry in &entries {
        println!(
            "{:<20} {:<5} {:<12} {:>5}  {}",
            entry.applied_at,
            entry.direction.to_string(),
            entry.delta_id.to_string(),
            entry.statements,
            entry.summary
        );
    }
    Ok(())
}
