mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use retreat_core::workspace::Workspace;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retreat")]
#[command(about = "Your retreat companion: itinerary, journals, planning tools and sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to a mirror provider (e.g. "firebase")
    Auth {
        provider: String,
    },
    /// Show workspace, schedule and sync status
    Status,
    /// Reconcile every record with the remote mirror (remote wins)
    Sync,
    /// Overwrite local records with the remote copies
    Pull,
    /// Send every local record to the remote mirror
    Push,
    /// Apply live remote changes as they happen, until interrupted
    Watch,
    /// Journaling: daily reflections, freeform entries, future letter
    Journal {
        #[command(subcommand)]
        command: commands::journal::JournalCommands,
    },
    /// Business-planning worksheets (SWOT, Ikigai, value prop, 90-day plan)
    Plan {
        #[command(subcommand)]
        command: commands::plan::PlanCommands,
    },
    /// The three-column idea board
    Board {
        #[command(subcommand)]
        command: commands::board::BoardCommands,
    },
    /// Packing checklist
    Supplies {
        #[command(subcommand)]
        command: commands::supplies::SuppliesCommands,
    },
    /// Itinerary: what's on now, what's next, reminders
    Schedule {
        #[command(subcommand)]
        command: commands::schedule::ScheduleCommands,
    },
    /// Export calendar files, backups and worksheets
    Export {
        #[command(subcommand)]
        command: commands::export::ExportCommands,
    },
    /// Restore records from a backup file
    Import {
        file: PathBuf,
    },
    /// AI assistance on journals and worksheets
    Assist {
        #[command(subcommand)]
        command: commands::assist::AssistCommands,
    },
    /// Workspace settings
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut workspace = Workspace::open()?;

    let result = match cli.command {
        Commands::Auth { provider } => commands::auth::run(&mut workspace, &provider).await,
        Commands::Status => commands::status::run(&workspace).await,
        Commands::Sync => commands::sync::run(&workspace).await,
        Commands::Pull => commands::sync::pull(&workspace).await,
        Commands::Push => commands::sync::push(&workspace).await,
        Commands::Watch => commands::watch::run(&workspace).await,
        Commands::Journal { command } => commands::journal::run(&workspace, command).await,
        Commands::Plan { command } => commands::plan::run(&workspace, command),
        Commands::Board { command } => commands::board::run(&workspace, command),
        Commands::Supplies { command } => commands::supplies::run(&workspace, command),
        Commands::Schedule { command } => commands::schedule::run(&workspace, command).await,
        Commands::Export { command } => commands::export::run(&workspace, command),
        Commands::Import { file } => commands::import::run(&workspace, &file),
        Commands::Assist { command } => commands::assist::run(&workspace, command).await,
        Commands::Config { command } => commands::config::run(&mut workspace, command),
    };

    // Let fire-and-forget mirror pushes finish before the process exits.
    if let Some(mirror) = &workspace.mirror {
        mirror.flush().await;
    }

    result
}
