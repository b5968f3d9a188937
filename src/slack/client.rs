//! Slack Web API calls: opening a Socket Mode connection, posting messages and answering slash commands.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::blocks::SlackMessage;
use crate::dispatcher::Notifier;

#[derive(Debug, Deserialize)]
struct SlackOpenSocketResponse {
    ok: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackOkResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    app_token: String,
    bot_token: String,
}

impl SlackApiClient {
    pub fn new(api_base: &str, app_token: &str, bot_token: &str) -> Result<SlackApiClient> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kube-slack-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create slack api client")?;

        Ok(SlackApiClient {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            app_token: app_token.trim().to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    /// Ask Slack for a fresh Socket Mode websocket url (app-level token)
    pub async fn open_socket_connection(&self) -> Result<String> {
        let response: SlackOpenSocketResponse = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base))
            .bearer_auth(&self.app_token)
            .send()
            .await
            .context("slack apps.connections.open request failed")?
            .json()
            .await
            .context("failed to parse slack apps.connections.open response")?;

        if !response.ok {
            bail!(
                "slack apps.connections.open failed: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        response
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("slack apps.connections.open did not return url"))
    }

    /// `chat.postMessage` with the bot token
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        debug!("{channel}: posting message");
        let response: SlackOkResponse = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await
            .context("slack chat.postMessage request failed")?
            .json()
            .await
            .context("failed to parse slack chat.postMessage response")?;

        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(())
    }

    /// Answer a slash command through its `response_url`
    ///
    /// Response urls don't take a token and answer with a plain `ok` body, so only the status is checked.
    pub async fn respond(&self, response_url: &str, message: &SlackMessage) -> Result<()> {
        let response = self
            .http
            .post(response_url)
            .json(message)
            .send()
            .await
            .context("slack response_url request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("slack response_url returned {status}: {body}");
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackApiClient {
    async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        SlackApiClient::post_message(self, channel, text).await
    }
}
