use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use dialoguer::Input;
use owo_colors::OwoColorize;
use retreat_core::autosave::AutoSaver;
use retreat_core::journal::{FreeformEntry, Journals};
use retreat_core::record::User;
use retreat_core::workspace::Workspace;
use serde_json::{Map, Value};

use super::{parse_fields, today};

/// Fields of the daily reflection form, in prompt order.
const DAILY_FIELDS: &[(&str, &str)] = &[
    ("intention", "Today's intention"),
    ("energy", "Energy level (1-10)"),
    ("insights", "Key insights"),
    ("clarity", "Moments of clarity"),
    ("challenges", "Challenges"),
    ("ideas", "Ideas generated"),
    ("gratitude1", "Grateful for (1)"),
    ("gratitude2", "Grateful for (2)"),
    ("gratitude3", "Grateful for (3)"),
];

const LETTER_FIELDS: &[(&str, &str)] = &[
    ("opening", "Dear future self..."),
    ("proud_of", "What I hope we're proud of"),
    ("reminder", "A reminder for hard days"),
];

#[derive(Subcommand)]
pub enum JournalCommands {
    /// Fill in today's reflection interactively (auto-saves as you go)
    Edit {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Set reflection fields directly, e.g. intention="Focus" energy=7
    Daily {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Show a day's reflection
    Show {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Add a freeform entry
    Write {
        text: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// List freeform entries, newest first
    List {
        #[arg(long)]
        user: Option<String>,
    },
    /// Show journaling prompts to write from
    Prompts,
    /// Write the letter to your future self
    Letter {
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a daily reflection (--date) or freeform entry (--id)
    Delete {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        user: Option<String>,
    },
}

fn resolve_user(workspace: &Workspace, user: Option<&str>) -> Result<User> {
    Ok(match user {
        Some(name) => User::from_name(name)?,
        None => workspace.user,
    })
}

pub async fn run(workspace: &Workspace, command: JournalCommands) -> Result<()> {
    match command {
        JournalCommands::Edit { date, user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            edit_daily(workspace, &date.unwrap_or_else(today), user).await
        }
        JournalCommands::Daily { date, user, fields } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let date = date.unwrap_or_else(today);
            let mut merged = workspace
                .journals_for(user)
                .daily(&date)
                .map(|r| r.fields)
                .unwrap_or_default();
            for (name, value) in parse_fields(&fields)? {
                merged.insert(name, value);
            }
            workspace.journals_for(user).save_daily(&date, merged)?;
            println!("Saved reflection for {date} ({user}).");
            Ok(())
        }
        JournalCommands::Show { date, user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let date = date.unwrap_or_else(today);
            match workspace.journals_for(user).daily(&date) {
                Some(reflection) => {
                    println!("{} ({})", date.bold(), user);
                    for (name, label) in DAILY_FIELDS {
                        if let Some(value) = reflection.fields.get(*name) {
                            println!("   {}: {}", label.dimmed(), render_value(value));
                        }
                    }
                    if let Some(ts) = &reflection.timestamp {
                        println!("   {}", format!("saved {ts}").dimmed());
                    }
                }
                None => println!("No reflection for {date} ({user})."),
            }
            Ok(())
        }
        JournalCommands::Write { text, date, user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let entry = workspace.journals_for(user).save_freeform(FreeformEntry {
                id: 0,
                date: date.unwrap_or_else(today),
                text,
                timestamp: String::new(),
            })?;
            println!("Saved entry [{}].", entry.id);
            Ok(())
        }
        JournalCommands::List { user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let entries = workspace.journals_for(user).entries();
            if entries.is_empty() {
                println!("No freeform entries yet ({user}).");
            }
            for entry in entries {
                println!("{} {}", entry.date.bold(), format!("[{}]", entry.id).dimmed());
                println!("   {}", entry.text);
            }
            Ok(())
        }
        JournalCommands::Prompts => {
            let prompts = workspace.itinerary()?.prompts;
            println!("{}", "General".bold());
            for prompt in &prompts.general {
                println!("   {prompt}");
            }
            println!("\n{}", "Couples".bold());
            for prompt in &prompts.couples {
                println!("   {prompt}");
            }
            Ok(())
        }
        JournalCommands::Letter { user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let journals = workspace.journals_for(user);
            let existing = journals.future_letter().fields;

            let mut fields = Map::new();
            for (name, label) in LETTER_FIELDS {
                let initial = existing
                    .get(*name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let text: String = Input::new()
                    .with_prompt(*label)
                    .with_initial_text(initial)
                    .allow_empty(true)
                    .interact_text()?;
                fields.insert(name.to_string(), Value::String(text));
            }
            journals.save_future_letter(fields)?;
            println!("Letter saved. It will be waiting for you.");
            Ok(())
        }
        JournalCommands::Delete { date, id, user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let journals = workspace.journals_for(user);
            match (date, id) {
                (Some(date), None) => {
                    if journals.delete_daily(&date)? {
                        println!("Deleted reflection for {date}.");
                    } else {
                        println!("No reflection for {date}.");
                    }
                }
                (None, Some(id)) => {
                    if journals.delete_freeform(id)? {
                        println!("Deleted entry [{id}].");
                    } else {
                        println!("No entry [{id}].");
                    }
                }
                _ => anyhow::bail!("Pass exactly one of --date or --id"),
            }
            Ok(())
        }
    }
}

/// Interactive reflection entry. Every answer triggers the debounced
/// auto-saver; finishing (or an early ctrl-c on a later field) still ends
/// with a final immediate save, mirroring the form's blur behavior.
async fn edit_daily(workspace: &Workspace, date: &str, user: User) -> Result<()> {
    let journals = Journals::for_user(workspace, user);
    let existing = journals.daily(date).map(|r| r.fields).unwrap_or_default();

    println!("Daily reflection for {} ({})\n", date.bold(), user);

    let draft: Arc<Mutex<Map<String, Value>>> = Arc::new(Mutex::new(existing));

    let autosaver = {
        let draft = Arc::clone(&draft);
        let workspace = workspace.clone();
        let date = date.to_string();
        AutoSaver::new(Duration::from_secs(2), move || {
            let fields = draft.lock().unwrap().clone();
            if let Err(e) = Journals::for_user(&workspace, user).save_daily(&date, fields) {
                tracing::warn!(error = %e, "auto-save failed");
            }
        })
    };

    for (name, label) in DAILY_FIELDS {
        let initial = {
            let draft = draft.lock().unwrap();
            draft
                .get(*name)
                .map(render_value)
                .unwrap_or_default()
        };

        // Prompt on a blocking thread: the runtime is single-threaded, and
        // the debounce timer can only fire while we are not holding it.
        let label = *label;
        let answer: String = tokio::task::spawn_blocking(move || {
            Input::new()
                .with_prompt(label)
                .with_initial_text(initial)
                .allow_empty(true)
                .interact_text()
        })
        .await??;

        let value = match serde_json::from_str::<Value>(&answer) {
            Ok(v @ Value::Number(_)) => v,
            _ => Value::String(answer),
        };
        draft.lock().unwrap().insert(name.to_string(), value);
        autosaver.trigger();
    }

    autosaver.cancel();
    let fields = draft.lock().unwrap().clone();
    journals.save_daily(date, fields)?;
    println!("\nSaved reflection for {date}.");
    Ok(())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
