//! retreat-provider-firebase - Firebase mirror provider for the retreat CLI
//!
//! This binary implements the retreat provider protocol, communicating
//! with the CLI via JSON over stdin/stdout.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/retreat/providers/firebase/config.json
//!   ~/.config/retreat/providers/firebase/tokens/{account}.json

mod config;
mod firebase;

use retreat_core::record::Scope;
use retreat_core::remote::protocol::{
    AuthInitResponse, Command, CredentialField, FieldType, RecordSlot, Request, Response,
};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::config::AppConfig;

/// How often subscriptions re-check their slot.
const SUBSCRIBE_POLL: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = Response::error(&format!("Failed to parse request: {}", e));
                writeln!(stdout, "{}", response).unwrap();
                stdout.flush().unwrap();
                continue;
            }
        };

        // Subscribe streams responses itself and only returns on teardown.
        if request.command == Command::Subscribe {
            handle_subscribe(&request.params, &mut stdout).await;
            break;
        }

        let response = handle_request(request).await;

        writeln!(stdout, "{}", response).unwrap();
        stdout.flush().unwrap();
    }
}

async fn handle_request(request: Request) -> String {
    match request.command {
        Command::AuthInit => handle_auth_init(),
        Command::AuthSubmit => handle_auth_submit(&request.params).await,
        Command::PullRecord => handle_pull(&request.params).await,
        Command::PushRecord => handle_push(&request.params).await,
        Command::Generate => handle_generate(&request.params).await,
        Command::Subscribe => Response::error("Subscribe is handled as a stream"),
    }
}

fn handle_auth_init() -> String {
    Response::success(AuthInitResponse {
        fields: vec![
            CredentialField {
                id: "email".to_string(),
                label: "Email".to_string(),
                field_type: FieldType::Text,
                help: None,
            },
            CredentialField {
                id: "password".to_string(),
                label: "Password".to_string(),
                field_type: FieldType::Password,
                help: None,
            },
        ],
    })
}

#[derive(Debug, Deserialize)]
struct AuthSubmitParams {
    email: String,
    password: String,
}

async fn handle_auth_submit(params: &serde_json::Value) -> String {
    let creds: AuthSubmitParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let mut app = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };
    app.apply_overrides(params);

    match firebase::sign_in(&app, &creds.email, &creds.password).await {
        Ok(identifier) => Response::success(identifier),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct SlotParams {
    firebase_account: String,
    scope: Scope,
    key: String,
}

/// Load config (with request overrides) and a live session for the account.
async fn prepare(
    params: &serde_json::Value,
    account: &str,
) -> anyhow::Result<(AppConfig, config::StoredToken)> {
    let mut app = AppConfig::load()?;
    app.apply_overrides(params);
    let token = firebase::session(&app, account).await?;
    Ok((app, token))
}

async fn handle_pull(params: &serde_json::Value) -> String {
    let slot_params: SlotParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let (app, token) = match prepare(params, &slot_params.firebase_account).await {
        Ok(pair) => pair,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    match firebase::pull(&app, &token, slot_params.scope, &slot_params.key).await {
        Ok(slot) => Response::success(slot),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct PushParams {
    firebase_account: String,
    scope: Scope,
    key: String,
    value: serde_json::Value,
    updated_by: String,
}

async fn handle_push(params: &serde_json::Value) -> String {
    let push_params: PushParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let (app, token) = match prepare(params, &push_params.firebase_account).await {
        Ok(pair) => pair,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    match firebase::push(
        &app,
        &token,
        push_params.scope,
        &push_params.key,
        &push_params.value,
        &push_params.updated_by,
    )
    .await
    {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct GenerateParams {
    firebase_account: String,
    prompt: String,
    #[serde(default)]
    model: Option<String>,
}

async fn handle_generate(params: &serde_json::Value) -> String {
    let gen_params: GenerateParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    if gen_params.prompt.trim().is_empty() {
        return Response::error("Prompt is required and must not be empty");
    }

    let (app, token) = match prepare(params, &gen_params.firebase_account).await {
        Ok(pair) => pair,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    match firebase::generate(&app, &token, &gen_params.prompt, gen_params.model.as_deref()).await {
        Ok(reply) => Response::success(reply),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

/// Stream slot changes as one response line each. The first line is the
/// current snapshot; the CLI discards it on its side. Ends when the CLI
/// closes the pipe (the process is killed on drop).
async fn handle_subscribe(params: &serde_json::Value, stdout: &mut io::Stdout) {
    let slot_params: SlotParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => {
            let _ = writeln!(stdout, "{}", Response::error(&format!("Invalid params: {}", e)));
            return;
        }
    };

    let (app, mut token) = match prepare(params, &slot_params.firebase_account).await {
        Ok(pair) => pair,
        Err(e) => {
            let _ = writeln!(stdout, "{}", Response::error(&format!("{:#}", e)));
            return;
        }
    };

    let mut etag: Option<String> = None;
    loop {
        // Sessions expire mid-watch; refresh as needed.
        if token.expired() {
            token = match firebase::session(&app, &slot_params.firebase_account).await {
                Ok(t) => t,
                Err(e) => {
                    let _ = writeln!(stdout, "{}", Response::error(&format!("{:#}", e)));
                    return;
                }
            };
        }

        match firebase::poll_slot(
            &app,
            &token,
            slot_params.scope,
            &slot_params.key,
            etag.as_deref(),
        )
        .await
        {
            Ok(Some((new_etag, slot))) => {
                etag = Some(new_etag);
                // Always emit, even for an empty slot: the CLI discards the
                // first delivery as the attach snapshot, so suppressing an
                // empty snapshot here would make it discard a real change
                // instead. Empty slots travel as a null-data delivery.
                let delivery = slot.unwrap_or(RecordSlot {
                    data: serde_json::Value::Null,
                    updated_at: None,
                    updated_by: None,
                });
                if writeln!(stdout, "{}", Response::success(delivery)).is_err() {
                    return;
                }
                if stdout.flush().is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                eprintln!("poll failed: {:#}", e);
            }
        }

        tokio::time::sleep(SUBSCRIBE_POLL).await;
    }
}
