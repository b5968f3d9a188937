//! Slack front-end: a Socket Mode connection receiving slash commands.
//!
//! Envelopes are handled one at a time. A command is acknowledged, dispatched and answered
//! before the next envelope is read off the socket.

pub mod blocks;
pub mod client;
pub mod commands;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

use crate::{
    dispatcher::Dispatcher,
    prometheus::{FAILED_CHAT_DELIVERIES, SOCKET_RECONNECTS},
};
use client::SlackApiClient;
use commands::SlashCommand;

#[derive(Debug, Deserialize)]
struct SocketEnvelope {
    // `hello` and `disconnect` carry no envelope id
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    Reconnect,
}

pub struct ChatFrontend {
    slack: SlackApiClient,
    dispatcher: Dispatcher,
    reconnect_delay: Duration,
}

impl ChatFrontend {
    pub fn new(slack: SlackApiClient, dispatcher: Dispatcher, reconnect_delay: Duration) -> ChatFrontend {
        ChatFrontend {
            slack,
            dispatcher,
            reconnect_delay,
        }
    }

    /// Keep a Socket Mode connection open until `shutdown` is notified
    ///
    /// Connection failures are logged and retried after `reconnect_delay`; they never end the loop.
    pub async fn run(&self, shutdown: Arc<Notify>) {
        loop {
            match self.slack.open_socket_connection().await {
                Ok(url) => {
                    info!("Slack socket mode connecting");
                    match self.run_session(&url, &shutdown).await {
                        Ok(SessionEnd::Shutdown) => {
                            info!("Slack socket mode connection closed");
                            return;
                        }
                        Ok(SessionEnd::Reconnect) => info!("Slack asked for a reconnect"),
                        Err(e) => warn!("Slack socket session error: {e:#}"),
                    }
                }
                Err(e) => error!("Could not open slack socket connection: {e:#}"),
            }

            SOCKET_RECONNECTS.inc();
            tokio::select! {
                _ = shutdown.notified() => {
                    info!("Slack socket mode stopped while reconnecting");
                    return;
                }
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn run_session(&self, socket_url: &str, shutdown: &Notify) -> Result<SessionEnd> {
        let (stream, _response) = connect_async(socket_url)
            .await
            .context("failed to connect slack socket mode websocket")?;
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    if let Err(e) = sink.send(WsMessage::Close(None)).await {
                        debug!("Slack socket was already gone on close: {e}");
                    }
                    return Ok(SessionEnd::Shutdown);
                }
                maybe_message = source.next() => {
                    let Some(message) = maybe_message else {
                        return Ok(SessionEnd::Reconnect);
                    };
                    let message = message.context("failed reading slack websocket message")?;
                    if let WsMessage::Close(frame) = &message {
                        debug!("Slack closed the socket: {frame:?}");
                        return Ok(SessionEnd::Reconnect);
                    }
                    let Some(envelope) = parse_socket_envelope(message)? else {
                        continue;
                    };

                    if let Some(envelope_id) = &envelope.envelope_id {
                        let ack = json!({ "envelope_id": envelope_id }).to_string();
                        sink.send(WsMessage::Text(ack.into()))
                            .await
                            .context("failed to send slack socket ack")?;
                    }

                    match envelope.envelope_type.as_str() {
                        "hello" => info!("Slack socket mode connected"),
                        "disconnect" => return Ok(SessionEnd::Reconnect),
                        "slash_commands" => self.handle_slash_command(envelope.payload).await,
                        other => debug!("Ignoring slack {other} envelope"),
                    }
                }
            }
        }
    }

    async fn handle_slash_command(&self, payload: Value) {
        let command: SlashCommand = match serde_json::from_value(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!("Could not read slash command payload: {e}");
                return;
            }
        };
        info!("{}: {} {}", command.channel_id, command.command, command.text);

        for message in commands::handle(&self.dispatcher, &command).await {
            if let Err(e) = self.slack.respond(&command.response_url, &message).await {
                error!("{}: could not answer {}: {e:#}", command.channel_id, command.command);
                FAILED_CHAT_DELIVERIES.inc();
            }
        }
    }
}

fn parse_socket_envelope(message: WsMessage) -> Result<Option<SocketEnvelope>> {
    let text = match message {
        WsMessage::Text(text) => text.to_string(),
        WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).context("invalid utf-8 slack socket payload")?,
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => return Ok(None),
    };
    let envelope = serde_json::from_str(&text).context("failed to parse slack socket envelope")?;
    Ok(Some(envelope))
}
