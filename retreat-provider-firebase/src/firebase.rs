//! Firebase REST calls: Identity Toolkit auth, Realtime Database reads
//! and writes, and the hosted generate function.

use anyhow::{Context, Result, anyhow, bail};
use retreat_core::record::Scope;
use retreat_core::remote::protocol::{GenerateReply, RecordSlot};
use retreat_core::remote::remote_path;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::{AppConfig, StoredToken};

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";
const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Email/password sign-in. Stores the session and returns the identifier.
pub async fn sign_in(config: &AppConfig, email: &str, password: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{SIGN_IN_URL}?key={}", config.api_key))
        .json(&json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        }))
        .send()
        .await
        .context("Could not reach the authentication service")?;

    if !response.status().is_success() {
        let detail = auth_error_detail(response.json().await.ok());
        bail!("Sign in failed: {detail}");
    }

    let signed_in: SignInResponse = response
        .json()
        .await
        .context("Unexpected sign-in response")?;

    let expires_in: i64 = signed_in.expires_in.parse().unwrap_or(3600);
    let token = StoredToken {
        uid: signed_in.local_id,
        email: signed_in.email.clone(),
        id_token: signed_in.id_token,
        refresh_token: signed_in.refresh_token,
        expires_at: chrono::Utc::now().timestamp() + expires_in,
    };
    token.save()?;

    Ok(signed_in.email)
}

fn auth_error_detail(body: Option<Value>) -> String {
    body.as_ref()
        .and_then(|b| b.pointer("/error/message"))
        .and_then(|m| m.as_str())
        .map(|code| match code {
            "EMAIL_NOT_FOUND" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" => {
                "wrong email or password".to_string()
            }
            "USER_DISABLED" => "this account is disabled".to_string(),
            "TOO_MANY_ATTEMPTS_TRY_LATER" => "too many attempts, try later".to_string(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "authentication service rejected the request".to_string())
}

/// A valid (refreshed if needed) session for an account.
pub async fn session(config: &AppConfig, account: &str) -> Result<StoredToken> {
    let mut token = StoredToken::load(account)?;
    if !token.expired() {
        return Ok(token);
    }

    #[derive(Debug, Deserialize)]
    struct RefreshResponse {
        id_token: String,
        refresh_token: String,
        expires_in: String,
        user_id: String,
    }

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{REFRESH_URL}?key={}", config.api_key))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", &token.refresh_token),
        ])
        .send()
        .await
        .context("Could not refresh the session")?;

    if !response.status().is_success() {
        bail!("Session expired. Run `retreat auth firebase` again.");
    }

    let refreshed: RefreshResponse = response.json().await.context("Unexpected refresh response")?;
    token.id_token = refreshed.id_token;
    token.refresh_token = refreshed.refresh_token;
    token.uid = refreshed.user_id;
    token.expires_at =
        chrono::Utc::now().timestamp() + refreshed.expires_in.parse::<i64>().unwrap_or(3600);
    token.save()?;

    Ok(token)
}

fn slot_url(config: &AppConfig, token: &StoredToken, scope: Scope, key: &str) -> String {
    let path = remote_path(scope, &token.uid, key);
    format!(
        "{}/{path}.json?auth={}",
        config.database_url.trim_end_matches('/'),
        token.id_token
    )
}

/// Read a record slot. `None` when nothing has been written there.
pub async fn pull(
    config: &AppConfig,
    token: &StoredToken,
    scope: Scope,
    key: &str,
) -> Result<Option<RecordSlot>> {
    let client = reqwest::Client::new();
    let response = client
        .get(slot_url(config, token, scope, key))
        .send()
        .await
        .context("Could not reach the database")?;

    if !response.status().is_success() {
        bail!("Database read failed: {}", response.status());
    }

    let value: Value = response.json().await.context("Unexpected database response")?;
    if value.is_null() {
        return Ok(None);
    }
    let slot: RecordSlot =
        serde_json::from_value(value).context("Record slot has an unexpected shape")?;
    Ok(Some(slot))
}

/// Replace a record slot, tagging the write with the server's timestamp
/// and the writer's identity.
pub async fn push(
    config: &AppConfig,
    token: &StoredToken,
    scope: Scope,
    key: &str,
    value: &Value,
    updated_by: &str,
) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .put(slot_url(config, token, scope, key))
        .json(&json!({
            "data": value,
            "updated_at": {".sv": "timestamp"},
            "updated_by": updated_by,
        }))
        .send()
        .await
        .context("Could not reach the database")?;

    if !response.status().is_success() {
        bail!("Database write failed: {}", response.status());
    }
    Ok(())
}

/// Poll a slot until the value changes; ETags keep the polling cheap.
/// Returns `(etag, slot)`; pass the previous etag to wait for a change.
pub async fn poll_slot(
    config: &AppConfig,
    token: &StoredToken,
    scope: Scope,
    key: &str,
    last_etag: Option<&str>,
) -> Result<Option<(String, Option<RecordSlot>)>> {
    let client = reqwest::Client::new();
    let mut request = client
        .get(slot_url(config, token, scope, key))
        .header("X-Firebase-ETag", "true");
    if let Some(etag) = last_etag {
        request = request.header("if-none-match", etag);
    }

    let response = request.send().await.context("Could not reach the database")?;

    if response.status() == reqwest::StatusCode::NOT_MODIFIED {
        return Ok(None);
    }
    if !response.status().is_success() {
        bail!("Database read failed: {}", response.status());
    }

    let etag = response
        .headers()
        .get("etag")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let value: Value = response.json().await.context("Unexpected database response")?;
    let slot = if value.is_null() {
        None
    } else {
        Some(serde_json::from_value(value).context("Record slot has an unexpected shape")?)
    };

    Ok(Some((etag, slot)))
}

/// Call the hosted generate function (a Firebase callable function). The
/// callable protocol wraps the payload in `data` and the reply in `result`.
pub async fn generate(
    config: &AppConfig,
    token: &StoredToken,
    prompt: &str,
    model: Option<&str>,
) -> Result<GenerateReply> {
    let endpoint = config
        .generate_endpoint
        .as_deref()
        .ok_or_else(|| anyhow!("No generate_endpoint configured for this project"))?;

    let mut payload = json!({"prompt": prompt});
    if let Some(model) = model {
        payload["model"] = json!(model);
    }

    let client = reqwest::Client::new();
    let response = client
        .post(endpoint)
        .bearer_auth(&token.id_token)
        .json(&json!({"data": payload}))
        .send()
        .await
        .context("Could not reach the generate endpoint")?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .unwrap_or_else(|_| json!({}));

    if !status.is_success() {
        let message = body
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .unwrap_or("generate endpoint rejected the request");
        return Ok(GenerateReply {
            success: false,
            response: None,
            error: Some(message.to_string()),
        });
    }

    let result = body.get("result").cloned().unwrap_or(body);
    let reply: GenerateReply = serde_json::from_value(result)
        .context("Generate endpoint returned an unexpected shape")?;
    Ok(reply)
}
