//! HTTP client for the eater's command API.

use anyhow::{Context, Result, bail};
use eater_types::{CommandRequest, CommandResponse, StatusSnapshot, errno};
use reqwest::StatusCode;

/// Connection to one eater server.
pub struct EaterClient {
    client: reqwest::Client,
    base_url: String,
}

impl EaterClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Send a command and return the eater's reply.
    ///
    /// A reply with a nonzero status is turned into an error.
    pub async fn send(&self, request: &CommandRequest) -> Result<CommandResponse> {
        let url = format!("{}/api/commands", self.base_url);
        let command = request.command.name();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("cannot reach eater server at {}", self.base_url))?;

        let http = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("{command}: failed to read reply"))?;
        let reply: CommandResponse = serde_json::from_str(&body)
            .with_context(|| format!("{command}: unexpected reply ({http}): {body}"))?;
        if !reply.is_ok() {
            bail!(
                "{command} failed: {} ({})",
                reply.message,
                errno::describe(reply.status)
            );
        }
        Ok(reply)
    }

    /// Every status attribute.
    pub async fn status_all(&self) -> Result<StatusSnapshot> {
        let url = format!("{}/status", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("cannot reach eater server at {}", self.base_url))?;
        let http = response.status();
        if !http.is_success() {
            bail!("status failed: server returned {http}");
        }
        response
            .json()
            .await
            .context("status: malformed reply")
    }

    /// One status attribute, as the server renders it.
    pub async fn status(&self, name: &str) -> Result<String> {
        let url = format!("{}/status/{name}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("cannot reach eater server at {}", self.base_url))?;
        match response.status() {
            StatusCode::NOT_FOUND => bail!("no such status attribute: {name}"),
            http if !http.is_success() => bail!("status {name} failed: server returned {http}"),
            _ => response
                .text()
                .await
                .with_context(|| format!("status {name}: failed to read reply")),
        }
    }
}
