use serde::Deserialize;

use super::blocks::{self, SlackMessage};
use crate::dispatcher::{Arguments, Dispatcher, Frontend, Operation};

pub const PODLOGS_USAGE: &str = "Please provide a pod name: `/podlogs <pod-name> [namespace]`";

/// The parts of a Socket Mode `slash_commands` payload we use
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_id: String,
    pub response_url: String,
}

/// What a slash command turns into before anything is dispatched
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Dispatch(Operation, Arguments),
    /// Answered right away without touching the dispatcher
    Reply(String),
}

pub fn parse(command: &str, text: &str) -> ParsedCommand {
    let mut words = text.split_whitespace();
    match command {
        "/pods" => ParsedCommand::Dispatch(Operation::ListPods, namespace_argument(words.next())),
        "/deployments" => ParsedCommand::Dispatch(Operation::ListDeployments, namespace_argument(words.next())),
        "/podlogs" => match words.next() {
            Some(pod_name) => ParsedCommand::Dispatch(
                Operation::GetPodLogs,
                namespace_argument(words.next()).with("pod_name", pod_name),
            ),
            None => ParsedCommand::Reply(PODLOGS_USAGE.into()),
        },
        "/cluster" => ParsedCommand::Dispatch(Operation::GetClusterContext, Arguments::new()),
        "/contexts" => ParsedCommand::Dispatch(Operation::ListContexts, Arguments::new()),
        other => ParsedCommand::Reply(format!("Unknown command: {other}")),
    }
}

fn namespace_argument(namespace: Option<&str>) -> Arguments {
    match namespace {
        Some(namespace) => Arguments::new().with("namespace", namespace),
        None => Arguments::new(),
    }
}

/// Run a slash command to completion and render the messages to post back
pub async fn handle(dispatcher: &Dispatcher, command: &SlashCommand) -> Vec<SlackMessage> {
    match parse(&command.command, &command.text) {
        ParsedCommand::Dispatch(operation, arguments) => {
            let result = dispatcher.dispatch(operation, &arguments, Frontend::Chat).await;
            blocks::render(&result)
        }
        ParsedCommand::Reply(text) => vec![SlackMessage::plain(text)],
    }
}
