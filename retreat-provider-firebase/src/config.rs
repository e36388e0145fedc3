//! Provider configuration and token storage.
//!
//! Layout under the user config directory:
//!   ~/.config/retreat/providers/firebase/config.json
//!   ~/.config/retreat/providers/firebase/tokens/{account}.json

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Project settings the user copies from the Firebase console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: String,
    pub database_url: String,
    /// Cloud function endpoint for generative-text calls.
    #[serde(default)]
    pub generate_endpoint: Option<String>,
}

/// A signed-in account's tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Unix seconds when `id_token` stops working.
    pub expires_at: i64,
}

fn provider_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("retreat/providers/firebase");
    Ok(dir)
}

impl AppConfig {
    pub fn load() -> Result<AppConfig> {
        let path = provider_dir()?.join("config.json");
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Missing Firebase config. Create {} with:\n\
                 {{\"api_key\": \"...\", \"database_url\": \"https://<project>.firebaseio.com\"}}",
                path.display()
            )
        })?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid Firebase config at {}", path.display()))
    }

    /// Values passed in the request's remote config override the file.
    pub fn apply_overrides(&mut self, params: &serde_json::Value) {
        if let Some(url) = params.get("firebase_database_url").and_then(|v| v.as_str()) {
            self.database_url = url.to_string();
        }
        if let Some(endpoint) = params.get("generate_endpoint").and_then(|v| v.as_str()) {
            self.generate_endpoint = Some(endpoint.to_string());
        }
    }
}

fn token_path(account: &str) -> Result<PathBuf> {
    // Accounts are email addresses; keep the file name tame.
    let safe: String = account
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    Ok(provider_dir()?.join("tokens").join(format!("{safe}.json")))
}

impl StoredToken {
    pub fn load(account: &str) -> Result<StoredToken> {
        let path = token_path(account)?;
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "No stored session for {account}. Run `retreat auth firebase` first."
            )
        })?;
        serde_json::from_str(&content)
            .with_context(|| format!("Corrupt token file at {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = token_path(&self.email)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at - 60
    }
}
