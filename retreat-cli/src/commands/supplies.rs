use anyhow::Result;
use clap::Subcommand;
use dialoguer::Confirm;
use retreat_core::workspace::Workspace;

use crate::render::render_checklist;

#[derive(Subcommand)]
pub enum SuppliesCommands {
    /// Show the checklist with packing progress
    List,
    /// Toggle an item by its key (e.g. `0_2`, or `custom_<id>`)
    Check {
        key: String,
    },
    /// Add a custom item to a category
    Add {
        category: String,
        item: String,
    },
    /// Edit a custom item
    Edit {
        id: i64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        item: Option<String>,
    },
    /// Delete a custom item
    Delete {
        id: i64,
    },
    /// Uncheck everything (custom items stay)
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(workspace: &Workspace, command: SuppliesCommands) -> Result<()> {
    match command {
        SuppliesCommands::List => {
            println!("{}", render_checklist(&workspace.supplies()));
            Ok(())
        }
        SuppliesCommands::Check { key } => {
            let mut supplies = workspace.supplies();
            let checked = supplies.toggle(&key);
            workspace.save_supplies(&supplies)?;
            println!("{key}: {}", if checked { "checked" } else { "unchecked" });
            Ok(())
        }
        SuppliesCommands::Add { category, item } => {
            let mut supplies = workspace.supplies();
            let id = supplies.add_custom(&category, &item);
            workspace.save_supplies(&supplies)?;
            println!("Added '{item}' to {category} [{id}].");
            Ok(())
        }
        SuppliesCommands::Edit { id, category, item } => {
            let mut supplies = workspace.supplies();
            let current = supplies
                .custom
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| anyhow::anyhow!("No custom item [{id}]"))?;

            let category = category.unwrap_or_else(|| current.category.clone());
            let item = item.unwrap_or_else(|| current.item.clone());
            supplies.edit_custom(id, &category, &item);
            workspace.save_supplies(&supplies)?;
            println!("Updated [{id}].");
            Ok(())
        }
        SuppliesCommands::Delete { id } => {
            let mut supplies = workspace.supplies();
            if !supplies.delete_custom(id) {
                anyhow::bail!("No custom item [{id}]");
            }
            workspace.save_supplies(&supplies)?;
            println!("Deleted [{id}].");
            Ok(())
        }
        SuppliesCommands::Reset { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Uncheck every item?")
                    .default(false)
                    .interact()?;
            if !confirmed {
                println!("Nothing changed.");
                return Ok(());
            }
            let mut supplies = workspace.supplies();
            supplies.reset();
            workspace.save_supplies(&supplies)?;
            println!("Checklist reset.");
            Ok(())
        }
    }
}
