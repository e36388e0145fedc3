use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use owo_colors::OwoColorize;
use retreat_core::schedule::Itinerary;
use retreat_core::workspace::Workspace;

use crate::render::Render;

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Print the full itinerary
    Show,
    /// What's happening right now
    Now,
    /// What's next today
    Next,
    /// Stay running and notify ~15 minutes before each activity
    Remind,
}

pub async fn run(workspace: &Workspace, command: ScheduleCommands) -> Result<()> {
    let itinerary = workspace.itinerary()?;

    match command {
        ScheduleCommands::Show => {
            for (i, (date, day)) in itinerary.schedule.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", date.dimmed());
                println!("{}", day.render());
            }
            Ok(())
        }
        ScheduleCommands::Now => {
            let now = chrono::Local::now().naive_local();
            match itinerary.current_activity(now) {
                Some(activity) => println!("{}", activity.render()),
                None => println!("Nothing scheduled right now."),
            }
            Ok(())
        }
        ScheduleCommands::Next => {
            let now = chrono::Local::now().naive_local();
            match itinerary.next_activity(now) {
                Some(activity) => println!("{}", activity.render()),
                None => println!("Nothing more today."),
            }
            Ok(())
        }
        ScheduleCommands::Remind => remind(&itinerary).await,
    }
}

/// Check once a minute for activities starting in about fifteen minutes
/// and show a desktop notification for each, once.
async fn remind(itinerary: &Itinerary) -> Result<()> {
    println!("Reminders on. Leave this running (ctrl-c to stop).\n");

    let mut notified: HashSet<String> = HashSet::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(60));

    loop {
        ticker.tick().await;

        let now = chrono::Local::now().naive_local();
        let today = now.date().to_string();

        for activity in itinerary.upcoming(now) {
            let key = format!("{today}-{}-{}", activity.time, activity.title);
            if !notified.insert(key) {
                continue;
            }

            println!("   {} {}", "upcoming".yellow(), activity.render());
            let shown = notify_rust::Notification::new()
                .summary(&format!("Upcoming: {}", activity.title))
                .body(&format!(
                    "Starting in 15 minutes at {}\n\n{}",
                    activity.time, activity.description
                ))
                .show();
            if let Err(e) = shown {
                tracing::warn!(error = %e, "could not display notification");
            }
        }
    }
}
