//! Defines the JSON protocol used for communication between the retreat
//! CLI and provider binaries over stdin/stdout.
//!
//! The protocol is language-agnostic: any executable that speaks it can
//! mirror records. Providers manage their own credentials and tokens; the
//! CLI just passes provider-specific parameters from its config.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::record::Scope;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    AuthInit,
    AuthSubmit,
    PullRecord,
    PushRecord,
    Subscribe,
    Generate,
}

/// Request sent from CLI to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to CLI.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap()
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap()
    }
}

// ============================================================================
// Auth
// ============================================================================

/// A field the provider needs to authenticate (e.g. email, password).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialField {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Password,
}

/// Ask the provider which credential fields it needs.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthInit {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthInitResponse {
    pub fields: Vec<CredentialField>,
}

impl ProviderCommand for AuthInit {
    type Response = AuthInitResponse;
    fn command() -> Command {
        Command::AuthInit
    }
}

/// Submit gathered credentials to complete authentication.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSubmit {
    /// Gathered credentials, keyed by field id.
    #[serde(flatten)]
    pub credentials: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for AuthSubmit {
    type Response = String; // Account identifier (e.g. email)
    fn command() -> Command {
        Command::AuthSubmit
    }
}

// ============================================================================
// Records
// ============================================================================

/// A record's remote slot: the value plus the write tags the provider's
/// backend attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSlot {
    pub data: serde_json::Value,
    /// Server timestamp of the write, milliseconds.
    #[serde(default)]
    pub updated_at: Option<i64>,
    /// Identity of the writer.
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Read a record's remote slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct PullRecord {
    /// Provider-specific config (e.g. firebase_account, firebase_database_url)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub scope: Scope,
    pub key: String,
}

impl ProviderCommand for PullRecord {
    type Response = Option<RecordSlot>;
    fn command() -> Command {
        Command::PullRecord
    }
}

/// Replace a record's remote slot. The provider tags the write with a
/// server timestamp and the given writer identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct PushRecord {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub scope: Scope,
    pub key: String,
    pub value: serde_json::Value,
    pub updated_by: String,
}

impl ProviderCommand for PushRecord {
    type Response = ();
    fn command() -> Command {
        Command::PushRecord
    }
}

/// Start a live subscription on a record slot.
///
/// Unlike the other commands this is not request/response: the provider
/// keeps running and emits one `Response<RecordSlot>` JSON line per
/// delivery, the first of which is the current snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct Subscribe {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub scope: Scope,
    pub key: String,
}

// ============================================================================
// Generative text
// ============================================================================

/// Ask the provider's generate endpoint for a completion.
#[derive(Debug, Serialize, Deserialize)]
pub struct Generate {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The endpoint's verbatim reply shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderCommand for Generate {
    type Response = GenerateReply;
    fn command() -> Command {
        Command::Generate
    }
}
