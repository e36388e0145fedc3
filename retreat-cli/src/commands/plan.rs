use anyhow::Result;
use clap::Subcommand;
use dialoguer::Input;
use owo_colors::OwoColorize;
use retreat_core::workspace::Workspace;
use retreat_core::worksheets::{Worksheet, WorksheetData};
use serde_json::{Map, Value};

use super::parse_fields;

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Set worksheet fields, e.g. `retreat plan set swot strengths="small team"`
    Set {
        /// One of: swot, ikigai, value, action
        worksheet: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Show one worksheet, or all of them
    Show {
        worksheet: Option<String>,
    },
    /// Fill a worksheet field by field
    Edit {
        worksheet: String,
    },
}

pub fn run(workspace: &Workspace, command: PlanCommands) -> Result<()> {
    match command {
        PlanCommands::Set { worksheet, fields } => {
            let worksheet = Worksheet::from_name(&worksheet)?;
            let updates = parse_fields(&fields)?;

            // Only fields the worksheet actually has.
            for name in updates.keys() {
                if !worksheet.fields().contains(&name.as_str()) {
                    anyhow::bail!(
                        "{} has no '{}' field. Fields: {}",
                        worksheet,
                        name,
                        worksheet.fields().join(", ")
                    );
                }
            }

            workspace.worksheets().set_fields(worksheet, updates)?;
            println!("Saved {worksheet}.");
            Ok(())
        }
        PlanCommands::Show { worksheet } => {
            let selected = match worksheet {
                Some(name) => vec![Worksheet::from_name(&name)?],
                None => Worksheet::ALL.to_vec(),
            };
            for (i, worksheet) in selected.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_worksheet(*worksheet, &workspace.worksheets().load(*worksheet));
            }
            Ok(())
        }
        PlanCommands::Edit { worksheet } => {
            let worksheet = Worksheet::from_name(&worksheet)?;
            let existing = workspace.worksheets().load(worksheet);

            println!("{}\n", worksheet.to_string().bold());

            let mut updates = Map::new();
            for name in worksheet.fields() {
                let initial = existing.field(name).unwrap_or_default().to_string();
                let answer: String = Input::new()
                    .with_prompt(field_label(name))
                    .with_initial_text(initial)
                    .allow_empty(true)
                    .interact_text()?;
                updates.insert(name.to_string(), Value::String(answer));
            }

            workspace.worksheets().set_fields(worksheet, updates)?;
            println!("\nSaved {worksheet}.");
            Ok(())
        }
    }
}

fn print_worksheet(worksheet: Worksheet, data: &WorksheetData) {
    println!("{}", worksheet.to_string().bold());
    for name in worksheet.fields() {
        let value = data.field(name).unwrap_or("(not filled in)");
        println!("   {}: {}", field_label(name).dimmed(), value);
    }
    if let Some(modified) = &data.last_modified {
        println!("   {}", format!("last modified {modified}").dimmed());
    }
}

/// Human label from a snake_case field id.
fn field_label(name: &str) -> String {
    let mut label = name.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}
