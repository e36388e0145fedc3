use anyhow::Result;
use owo_colors::OwoColorize;
use retreat_core::record::RecordKey;
use retreat_core::supplies::default_item_count;
use retreat_core::workspace::Workspace;

use crate::render::Render;

pub async fn run(workspace: &Workspace) -> Result<()> {
    println!("{}", "retreat".bold());
    println!("   User: {}", workspace.user);
    println!("   Data: {}", workspace.config.display_path().display());

    match &workspace.mirror {
        Some(mirror) => {
            println!(
                "   Mirror: {} ({})",
                mirror.remote().provider.name().green(),
                mirror.account()
            );
        }
        None => println!("   Mirror: {}", "off (local only)".dimmed()),
    }

    let stored = RecordKey::ALL
        .into_iter()
        .filter(|key| workspace.store.load_raw(*key).is_some())
        .count();
    println!("   Records: {stored}/{} stored", RecordKey::ALL.len());

    let supplies = workspace.supplies();
    let total = default_item_count() + supplies.custom.len();
    println!("   Packing: {}%", supplies.progress(total));

    let board = workspace.board();
    println!(
        "   Board: {} cards, {} ready",
        board.card_count(),
        board.ready.len()
    );

    // Where the schedule stands right now.
    let itinerary = workspace.itinerary()?;
    let now = chrono::Local::now().naive_local();
    println!();
    match itinerary.current_activity(now) {
        Some(activity) => println!("   Now: {}", activity.render()),
        None => println!("   Now: {}", "nothing scheduled".dimmed()),
    }
    match itinerary.next_activity(now) {
        Some(activity) => println!("   Next: {}", activity.render()),
        None => println!("   Next: {}", "nothing more today".dimmed()),
    }

    Ok(())
}
