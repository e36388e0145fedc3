use anyhow::Result;
use owo_colors::OwoColorize;
use retreat_core::sync::{Mirror, SyncOutcome};
use retreat_core::workspace::Workspace;
use std::sync::Arc;

use crate::render::Render;
use crate::utils::tui;

fn require_mirror(workspace: &Workspace) -> Result<&Arc<Mirror>> {
    workspace.mirror.as_ref().ok_or_else(|| {
        anyhow::anyhow!(
            "No mirror configured.\n\n\
            Sign in first with:\n  \
            retreat auth firebase"
        )
    })
}

pub async fn run(workspace: &Workspace) -> Result<()> {
    let mirror = require_mirror(workspace)?;

    println!("Syncing as {}\n", mirror.account());

    let mut pulled = 0;
    let mut pushed = 0;

    for key in mirror.keys() {
        let spinner = tui::create_spinner(format!("   {}", key.name()));
        let result = mirror.sync_key(&workspace.store, key).await;
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => {
                match outcome {
                    SyncOutcome::Pulled => pulled += 1,
                    SyncOutcome::Pushed => pushed += 1,
                    SyncOutcome::Empty => {}
                }
                println!("   {} {}", key.name(), outcome.render());
            }
            Err(e) => println!("   {} {}", key.name(), e.to_string().red()),
        }
    }

    println!("\nPulled: {pulled}, pushed: {pushed}");
    if pulled > 0 {
        println!("{}", "Remote copies win on conflict; local edits made while offline to records that also changed remotely are replaced.".dimmed());
    }

    Ok(())
}

pub async fn pull(workspace: &Workspace) -> Result<()> {
    let mirror = require_mirror(workspace)?;

    let spinner = tui::create_spinner("   pulling".to_string());
    let pulled = mirror.pull_all(&workspace.store).await;
    spinner.finish_and_clear();

    println!("Pulled {} record(s).", pulled?);
    Ok(())
}

pub async fn push(workspace: &Workspace) -> Result<()> {
    let mirror = require_mirror(workspace)?;

    let spinner = tui::create_spinner("   pushing".to_string());
    let pushed = mirror.push_all(&workspace.store).await;
    spinner.finish_and_clear();

    println!("Pushed {} record(s).", pushed?);
    Ok(())
}
