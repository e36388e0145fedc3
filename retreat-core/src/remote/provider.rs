//! Provider subprocess handling.
//!
//! One-shot commands spawn the provider binary, write one request line to
//! stdin and read the response from stdout. Subscriptions keep the child
//! alive and read one response line per delivery.

use crate::error::{RetreatError, RetreatResult};
use crate::remote::protocol::{
    Command, ProviderCommand, RecordSlot, Request, Response, Subscribe,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command as TokioCommand};
use tokio::time::timeout;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
/// Generous timeout for auth and generate, which wait on humans or models.
const SLOW_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_path(&self) -> RetreatResult<std::path::PathBuf> {
        let binary_name = format!("retreat-provider-{}", self.0);
        let binary_path = which::which(&binary_name).map_err(|_| {
            RetreatError::ProviderNotInstalled(format!(
                "Provider '{}' not found. Install it with:\n  cargo install {}",
                self.0, binary_name
            ))
        })?;
        Ok(binary_path)
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type,
    /// ensuring compile-time type safety.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> RetreatResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| RetreatError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    /// Call with the slow timeout (auth involves the user, generate a model).
    pub async fn call_slow<C: ProviderCommand>(&self, cmd: C) -> RetreatResult<C::Response> {
        timeout(SLOW_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| RetreatError::ProviderTimeout(SLOW_TIMEOUT.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> RetreatResult<R> {
        let request_json = encode_request(command, params)?;
        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                RetreatError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        // Write request to stdin (unwrap safe: we piped stdin above)
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        // Wait for process and collect output
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(RetreatError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.is_empty() {
            return Err(RetreatError::Provider(
                "Provider returned no response".into(),
            ));
        }

        decode_response(&response_str)
    }

    /// Start a live subscription. The returned handle yields one delivery
    /// per change; dropping it ends the child process.
    pub async fn subscribe(&self, params: Subscribe) -> RetreatResult<Subscription> {
        let request_json = encode_request(Command::Subscribe, params)?;
        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RetreatError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        // Keep stdin open: EOF is how the provider learns to stop.

        let stdout = child.stdout.take().unwrap();
        Ok(Subscription {
            lines: BufReader::new(stdout).lines(),
            _child: child,
            _stdin: stdin,
        })
    }
}

/// A live record subscription backed by a running provider process.
pub struct Subscription {
    lines: Lines<BufReader<ChildStdout>>,
    _child: Child,
    _stdin: tokio::process::ChildStdin,
}

impl Subscription {
    /// The next delivery, or `None` when the provider ends the stream.
    pub async fn next(&mut self) -> RetreatResult<Option<RecordSlot>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            return decode_response(&line).map(Some);
        }
    }
}

fn encode_request<P: Serialize>(command: Command, params: P) -> RetreatResult<String> {
    let params =
        serde_json::to_value(params).map_err(|e| RetreatError::Serialization(e.to_string()))?;
    let request = Request { command, params };
    serde_json::to_string(&request).map_err(|e| RetreatError::Serialization(e.to_string()))
}

fn decode_response<R: serde::de::DeserializeOwned>(raw: &str) -> RetreatResult<R> {
    let response: Response<R> = serde_json::from_str(raw)
        .map_err(|e| RetreatError::Provider(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(RetreatError::Provider(error)),
    }
}
