use anyhow::Result;
use owo_colors::OwoColorize;
use retreat_core::workspace::Workspace;

pub async fn run(workspace: &Workspace) -> Result<()> {
    let Some(mirror) = &workspace.mirror else {
        anyhow::bail!(
            "No mirror configured.\n\n\
            Sign in first with:\n  \
            retreat auth firebase"
        );
    };

    println!(
        "Watching for remote changes as {} (ctrl-c to stop)...\n",
        mirror.account()
    );

    mirror
        .watch(&workspace.store, |key| {
            println!("   {} {}", "updated".yellow(), key.name());
        })
        .await?;

    println!("All subscriptions ended.");
    Ok(())
}
