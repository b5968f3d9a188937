use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Coarse pod lifecycle state as reported in `status.phase`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    /// Anything the control plane reports that we don't recognise (or nothing at all) is `Unknown`
    pub fn parse(phase: Option<&str>) -> Phase {
        match phase {
            Some("Pending") => Phase::Pending,
            Some("Running") => Phase::Running,
            Some("Succeeded") => Phase::Succeeded,
            Some("Failed") => Phase::Failed,
            _ => Phase::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub message: Option<String>,
}

/// Runtime state of a single container. Exactly one of these is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ContainerRuntimeState {
    Waiting {
        reason: Option<String>,
        message: Option<String>,
    },
    Running {
        started_at: Option<DateTime<Utc>>,
    },
    Terminated {
        reason: Option<String>,
        message: Option<String>,
    },
}

impl ContainerRuntimeState {
    pub fn label(&self) -> &'static str {
        match self {
            ContainerRuntimeState::Waiting { .. } => "waiting",
            ContainerRuntimeState::Running { .. } => "running",
            ContainerRuntimeState::Terminated { .. } => "terminated",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ContainerRuntimeState::Waiting { reason, .. } | ContainerRuntimeState::Terminated { reason, .. } => {
                reason.as_deref()
            }
            ContainerRuntimeState::Running { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ContainerRuntimeState::Waiting { message, .. } | ContainerRuntimeState::Terminated { message, .. } => {
                message.as_deref()
            }
            ContainerRuntimeState::Running { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerStatusSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub state: ContainerRuntimeState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSnapshot {
    #[serde(rename = "type")]
    pub type_: String,
    pub reason: String,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Flattened view of a pod
///
/// `container_statuses` and `events` are only filled in by a detail read; list reads leave them out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "status")]
    pub phase: Phase,
    pub containers: Vec<String>,
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_statuses: Option<Vec<ContainerStatusSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventSnapshot>>,
}

impl PodSnapshot {
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentSnapshot {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "replicas")]
    pub desired_replicas: i32,
    /// `None` until the deployment controller has reported anything
    #[serde(rename = "available")]
    pub available_replicas: Option<i32>,
}

impl DeploymentSnapshot {
    /// Available replicas for display, where "not reported" means 0
    pub fn available_or_zero(&self) -> i32 {
        self.available_replicas.unwrap_or(0)
    }

    /// Only a reported count equal to the desired count is healthy
    pub fn fully_available(&self) -> bool {
        self.available_replicas == Some(self.desired_replicas)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub namespace: String,
}
