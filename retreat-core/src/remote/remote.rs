//! Remote record operations via providers.

use std::collections::HashMap;

use crate::error::RetreatResult;
use crate::record::{RecordKey, Scope};
use crate::remote::protocol::{
    AuthInit, AuthInitResponse, AuthSubmit, Generate, GenerateReply, PullRecord, PushRecord,
    RecordSlot, Subscribe,
};
use crate::remote::provider::{Provider, Subscription};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Remote mirror configuration (provider name plus its settings).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }

    /// The signed-in account identifier, stored by `retreat auth` under
    /// `<provider>_account` in the remote config.
    pub fn account(&self) -> Option<String> {
        self.config
            .0
            .get(&format!("{}_account", self.provider.name()))
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    pub fn set_account(&mut self, identifier: &str) {
        self.config.0.insert(
            format!("{}_account", self.provider.name()),
            toml::Value::String(identifier.to_string()),
        );
    }

    /// Ask the provider which credential fields it needs.
    pub async fn auth_init(&self) -> RetreatResult<AuthInitResponse> {
        self.provider.call_slow(AuthInit {}).await
    }

    /// Submit gathered credentials; returns the account identifier.
    pub async fn auth_submit(
        &self,
        credentials: serde_json::Map<String, serde_json::Value>,
    ) -> RetreatResult<String> {
        self.provider.call_slow(AuthSubmit { credentials }).await
    }

    pub async fn pull(&self, key: RecordKey) -> RetreatResult<Option<RecordSlot>> {
        self.provider
            .call(PullRecord {
                remote_config: self.remote_config(),
                scope: key.scope(),
                key: key.name().to_string(),
            })
            .await
    }

    pub async fn push(
        &self,
        key: RecordKey,
        value: serde_json::Value,
        updated_by: &str,
    ) -> RetreatResult<()> {
        self.provider
            .call(PushRecord {
                remote_config: self.remote_config(),
                scope: key.scope(),
                key: key.name().to_string(),
                value,
                updated_by: updated_by.to_string(),
            })
            .await
    }

    pub async fn subscribe(&self, key: RecordKey) -> RetreatResult<Subscription> {
        self.provider
            .subscribe(Subscribe {
                remote_config: self.remote_config(),
                scope: key.scope(),
                key: key.name().to_string(),
            })
            .await
    }

    pub async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> RetreatResult<GenerateReply> {
        self.provider
            .call_slow(Generate {
                remote_config: self.remote_config(),
                prompt: prompt.to_string(),
                model: model.map(String::from),
            })
            .await
    }
}

/// Scope determines the remote partition a record lives in.
pub fn remote_path(scope: Scope, uid: &str, key: &str) -> String {
    match scope {
        Scope::PerUser => format!("users/{uid}/{key}"),
        Scope::Shared => format!("workspace/{key}"),
    }
}
