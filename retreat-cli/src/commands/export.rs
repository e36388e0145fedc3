use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use retreat_core::ics;
use retreat_core::workspace::Workspace;
use retreat_core::worksheets::Worksheet;

use super::today;

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Calendar file for one activity, one day, or the whole retreat
    Ics {
        /// Day to export (YYYY-MM-DD); omit for the full schedule
        #[arg(long)]
        date: Option<String>,
        /// Export just the activity with this title (requires --date)
        #[arg(long)]
        activity: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Full JSON backup of every record
    Backup {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Worksheets as a markdown document
    Plan {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(workspace: &Workspace, command: ExportCommands) -> Result<()> {
    match command {
        ExportCommands::Ics {
            date,
            activity,
            output,
        } => {
            let itinerary = workspace.itinerary()?;

            let (content, default_name) = match (&date, &activity) {
                (None, None) => (
                    ics::full_ics(&itinerary)?,
                    "retreat-full-schedule.ics".to_string(),
                ),
                (Some(date), None) => {
                    let day = itinerary
                        .day(date)
                        .ok_or_else(|| anyhow::anyhow!("No itinerary for {date}"))?;
                    (
                        ics::day_ics(date, &day.activities)?,
                        format!("retreat-{}.ics", day.day.to_lowercase()),
                    )
                }
                (Some(date), Some(title)) => {
                    let day = itinerary
                        .day(date)
                        .ok_or_else(|| anyhow::anyhow!("No itinerary for {date}"))?;
                    let activity = day
                        .activities
                        .iter()
                        .find(|a| a.title.eq_ignore_ascii_case(title))
                        .ok_or_else(|| anyhow::anyhow!("No activity '{title}' on {date}"))?;
                    (
                        ics::activity_ics(date, activity)?,
                        format!("retreat-{}.ics", slug::slugify(&activity.title)),
                    )
                }
                (None, Some(_)) => anyhow::bail!("--activity requires --date"),
            };

            let path = output.unwrap_or_else(|| PathBuf::from(default_name));
            std::fs::write(&path, content)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        ExportCommands::Backup { output } => {
            let doc = workspace.store.export_all();
            let path =
                output.unwrap_or_else(|| PathBuf::from(format!("retreat-backup-{}.json", today())));
            std::fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        ExportCommands::Plan { output } => {
            let mut doc = String::from("# Retreat business plan\n");
            for worksheet in Worksheet::ALL {
                let data = workspace.worksheets().load(worksheet);
                doc.push_str(&format!("\n## {worksheet}\n\n"));
                for name in worksheet.fields() {
                    doc.push_str(&format!(
                        "- **{}**: {}\n",
                        name.replace('_', " "),
                        data.field(name).unwrap_or("(not filled in)")
                    ));
                }
            }

            let path = output.unwrap_or_else(|| PathBuf::from("retreat-plan.md"));
            std::fs::write(&path, doc)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
