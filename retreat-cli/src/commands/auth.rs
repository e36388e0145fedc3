use std::collections::HashMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use retreat_core::remote::protocol::FieldType;
use retreat_core::remote::provider::Provider;
use retreat_core::remote::{Remote, RemoteConfig};
use retreat_core::workspace::Workspace;

pub async fn run(workspace: &mut Workspace, provider_name: &str) -> Result<()> {
    let mut remote = match &workspace.config.remote {
        Some(remote) if remote.provider.name() == provider_name => remote.clone(),
        _ => Remote::new(
            Provider::from_name(provider_name),
            RemoteConfig(HashMap::new()),
        ),
    };

    println!("Signing in to {provider_name}...\n");

    // Ask the provider which credentials it needs, then gather them.
    let init = remote.auth_init().await?;

    let mut credentials = serde_json::Map::new();
    for field in &init.fields {
        if let Some(ref help) = field.help {
            println!("{}", help);
        }
        let value = match field.field_type {
            FieldType::Password => prompt_password(&field.label)?,
            FieldType::Text => prompt_text(&field.label)?,
        };
        credentials.insert(field.id.clone(), value.into());
    }

    println!("\nValidating credentials...");
    let identifier = remote.auth_submit(credentials).await?;

    remote.set_account(&identifier);
    workspace.config.remote = Some(remote);
    workspace.config.save()?;

    println!("Signed in as: {identifier}\n");
    println!("Your records now mirror through {provider_name}.");
    println!("Run `retreat sync` to reconcile, or `retreat watch` to follow live changes.");

    Ok(())
}

/// Prompt the user for text input.
fn prompt_text(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_string())
}

/// Prompt the user for password input (hidden).
fn prompt_password(label: &str) -> Result<String> {
    let prompt = format!("{}: ", label);
    rpassword::prompt_password(&prompt).context("Failed to read password")
}
