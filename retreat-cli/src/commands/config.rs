use anyhow::Result;
use clap::Subcommand;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use retreat_core::record::User;
use retreat_core::workspace::Workspace;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,
    /// Switch the active user (Dillyn or Ashlee)
    User {
        name: String,
    },
    /// Delete every record. This cannot be undone.
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(workspace: &mut Workspace, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("User: {}", workspace.user);
            println!("Data dir: {}", workspace.config.display_path().display());
            match &workspace.config.remote {
                Some(remote) => println!(
                    "Remote: {} ({})",
                    remote.provider.name(),
                    remote.account().unwrap_or_else(|| "not signed in".into())
                ),
                None => println!("Remote: none"),
            }
            Ok(())
        }
        ConfigCommands::User { name } => {
            let user = User::from_name(&name)?;
            workspace.set_current_user(user)?;
            println!("Now journaling as {user}.");
            Ok(())
        }
        ConfigCommands::Clear { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Clear ALL data? This cannot be undone.")
                    .default(false)
                    .interact()?;
            if !confirmed {
                println!("Nothing changed.");
                return Ok(());
            }
            workspace.store.clear_all()?;
            println!("{}", "All data cleared.".red());
            Ok(())
        }
    }
}
