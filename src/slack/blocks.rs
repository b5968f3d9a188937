//! Slack rendering of command results.
//!
//! Everything in here is deterministic: the same `CommandResult` always renders to the same messages.

use serde::Serialize;

use crate::{
    dispatcher::{CommandResult, Payload},
    snapshot::{ContextInfo, DeploymentSnapshot, Phase, PodSnapshot},
};

/// Longest log text posted as a single message, in characters
pub const LOG_CHUNK_CHARS: usize = 3000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    Section { text: TextObject },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Block {
        Block::Header {
            text: TextObject::PlainText { text: text.into() },
        }
    }

    pub fn section(text: impl Into<String>) -> Block {
        Block::Section {
            text: TextObject::Mrkdwn { text: text.into() },
        }
    }

    pub fn text(&self) -> &str {
        let object = match self {
            Block::Header { text } | Block::Section { text } => text,
        };
        match object {
            TextObject::PlainText { text } | TextObject::Mrkdwn { text } => text,
        }
    }
}

/// One message posted back to Slack. `text` doubles as the notification fallback when blocks are set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl SlackMessage {
    pub fn plain(text: impl Into<String>) -> SlackMessage {
        SlackMessage {
            text: text.into(),
            blocks: Vec::new(),
        }
    }

    fn blocks(header: &str, sections: impl IntoIterator<Item = String>) -> SlackMessage {
        let mut blocks = vec![Block::header(header)];
        blocks.extend(sections.into_iter().map(Block::section));
        SlackMessage {
            text: header.to_string(),
            blocks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Green,
    Yellow,
    Red,
}

impl Glyph {
    pub fn emoji(&self) -> &'static str {
        match self {
            Glyph::Green => "🟢",
            Glyph::Yellow => "🟡",
            Glyph::Red => "🔴",
        }
    }
}

pub fn pod_glyph(phase: Phase) -> Glyph {
    match phase {
        Phase::Running => Glyph::Green,
        Phase::Failed => Glyph::Red,
        _ => Glyph::Yellow,
    }
}

/// Green only when a reported available count matches the desired count
pub fn deployment_glyph(deployment: &DeploymentSnapshot) -> Glyph {
    if deployment.fully_available() {
        Glyph::Green
    } else {
        Glyph::Yellow
    }
}

pub fn render(result: &CommandResult) -> Vec<SlackMessage> {
    let payload = match result {
        Ok(payload) => payload,
        Err(err) => return vec![SlackMessage::plain(format!("Error: {err}"))],
    };
    match payload {
        Payload::Pods { namespace, pods } => vec![render_pods(namespace, pods)],
        Payload::Deployments { namespace, deployments } => vec![render_deployments(namespace, deployments)],
        Payload::Logs {
            pod_name,
            namespace,
            text,
        } => render_logs(pod_name, namespace, text),
        Payload::Context(context) => vec![render_context(context)],
        Payload::Contexts(contexts) => vec![render_contexts(contexts)],
        Payload::Notified { channel } => vec![SlackMessage::plain(format!("Message sent to {channel}"))],
    }
}

fn render_pods(namespace: &str, pods: &[PodSnapshot]) -> SlackMessage {
    if pods.is_empty() {
        return SlackMessage::plain(format!("No pods found in namespace '{namespace}'"));
    }
    let header = format!("📦 Pods in namespace: {namespace}");
    SlackMessage::blocks(&header, pods.iter().map(pod_section))
}

fn pod_section(pod: &PodSnapshot) -> String {
    let mut text = format!(
        "{} *{}*\n• Status: {}\n• Containers: {}",
        pod_glyph(pod.phase).emoji(),
        pod.name,
        pod.phase,
        pod.containers.join(", ")
    );

    if !pod.is_running() && !pod.conditions.is_empty() {
        text.push_str("\n• Conditions:");
        for condition in &pod.conditions {
            if let Some(message) = condition.message.as_deref().filter(|m| !m.is_empty()) {
                text.push_str(&format!("\n  - {}: {message}", condition.type_));
            }
        }
    }
    text
}

fn render_deployments(namespace: &str, deployments: &[DeploymentSnapshot]) -> SlackMessage {
    if deployments.is_empty() {
        return SlackMessage::plain(format!("No deployments found in namespace '{namespace}'"));
    }
    let header = format!("🚀 Deployments in namespace: {namespace}");
    SlackMessage::blocks(
        &header,
        deployments.iter().map(|d| {
            format!(
                "{} *{}*\n• Replicas: {}\n• Available: {}/{}",
                deployment_glyph(d).emoji(),
                d.name,
                d.desired_replicas,
                d.available_or_zero(),
                d.desired_replicas
            )
        }),
    )
}

fn render_logs(pod_name: &str, namespace: &str, text: &str) -> Vec<SlackMessage> {
    if text.is_empty() {
        return vec![SlackMessage::plain(format!(
            "No information available for pod '{pod_name}' in namespace '{namespace}'"
        ))];
    }

    let chunks = chunk_text(text, LOG_CHUNK_CHARS);
    if chunks.len() == 1 {
        return vec![SlackMessage::plain(format!("```\n{text}\n```"))];
    }
    let total = chunks.len();
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| SlackMessage::plain(format!("```\n{chunk}\n``` (Part {}/{total})", i + 1)))
        .collect()
}

fn render_context(context: &ContextInfo) -> SlackMessage {
    SlackMessage::blocks(
        "☸️ Current Kubernetes Context",
        [format!(
            "*Context:* {}\n*Cluster:* {}\n*Default Namespace:* {}",
            context.name, context.cluster, context.namespace
        )],
    )
}

fn render_contexts(contexts: &[ContextInfo]) -> SlackMessage {
    SlackMessage::blocks(
        "☸️ Available Kubernetes Contexts",
        contexts.iter().map(|c| {
            format!(
                "*Context:* {}\n• Cluster: {}\n• Default Namespace: {}",
                c.name, c.cluster, c.namespace
            )
        }),
    )
}

/// Split text into consecutive slices of at most `size` characters
///
/// Splits on char boundaries, so concatenating the slices gives back the input.
pub fn chunk_text(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}
