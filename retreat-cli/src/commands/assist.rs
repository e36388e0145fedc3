use anyhow::Result;
use clap::Subcommand;
use owo_colors::OwoColorize;
use retreat_core::RetreatError;
use retreat_core::assist::{self, Assist, MAX_REQUESTS_PER_DAY, MAX_REQUESTS_PER_HOUR};
use retreat_core::record::User;
use retreat_core::workspace::Workspace;
use retreat_core::worksheets::Worksheet;

use super::today;
use crate::utils::tui;

#[derive(Subcommand)]
pub enum AssistCommands {
    /// Send a free-form prompt
    Ask {
        prompt: String,
        #[arg(long)]
        model: Option<String>,
    },
    /// Coach's read on a day's reflection
    Reflection {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Review the SWOT worksheet
    Swot,
    /// Review the Ikigai worksheet
    Ikigai,
    /// Review the value proposition canvas
    Value,
    /// Review the 90-day action plan
    Action,
    /// Look for patterns across daily reflections
    Patterns {
        #[arg(long)]
        user: Option<String>,
    },
    /// Show how much of the hourly/daily quota is used
    Usage,
}

fn resolve_user(workspace: &Workspace, user: Option<&str>) -> Result<User> {
    Ok(match user {
        Some(name) => User::from_name(name)?,
        None => workspace.user,
    })
}

pub async fn run(workspace: &Workspace, command: AssistCommands) -> Result<()> {
    let assist = Assist::new(workspace.mirror.clone(), workspace.state_dir());

    let (prompt, model) = match command {
        AssistCommands::Ask { prompt, model } => (prompt, model),
        AssistCommands::Reflection { date, user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let date = date.unwrap_or_else(today);
            let Some(reflection) = workspace.journals_for(user).daily(&date) else {
                anyhow::bail!("No reflection for {date} ({user}) to analyze");
            };
            (assist::reflection_prompt(&date, &reflection), None)
        }
        AssistCommands::Swot => {
            let data = workspace.worksheets().load(Worksheet::Swot);
            (assist::swot_prompt(&data), None)
        }
        AssistCommands::Ikigai => {
            let data = workspace.worksheets().load(Worksheet::Ikigai);
            (assist::ikigai_prompt(&data), None)
        }
        AssistCommands::Value => {
            let data = workspace.worksheets().load(Worksheet::ValueProp);
            (assist::value_prop_prompt(&data), None)
        }
        AssistCommands::Action => {
            let data = workspace.worksheets().load(Worksheet::ActionPlan);
            (assist::action_plan_prompt(&data), None)
        }
        AssistCommands::Patterns { user } => {
            let user = resolve_user(workspace, user.as_deref())?;
            let journal = workspace.journals_for(user).load();
            let entries: Vec<_> = journal
                .daily
                .iter()
                .map(|(date, reflection)| (date.clone(), reflection.clone()))
                .collect();
            (assist::patterns_prompt(&entries)?, None)
        }
        AssistCommands::Usage => {
            let usage = assist.usage();
            println!(
                "This hour: {}/{}   Today: {}/{}",
                usage.hour, MAX_REQUESTS_PER_HOUR, usage.day, MAX_REQUESTS_PER_DAY
            );
            return Ok(());
        }
    };

    let spinner = tui::create_spinner("   thinking".to_string());
    let result = assist.generate(&prompt, model.as_deref()).await;
    spinner.finish_and_clear();

    // Failures come back as messages, not crashes: rate limits and offline
    // providers are everyday events here.
    match result {
        Ok(text) => println!("{text}"),
        Err(
            e @ (RetreatError::RateLimited(_)
            | RetreatError::NotAuthenticated
            | RetreatError::InvalidPrompt(_)
            | RetreatError::Provider(_)
            | RetreatError::ProviderTimeout(_)
            | RetreatError::ProviderNotInstalled(_)),
        ) => {
            println!("{}", e.to_string().red());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
