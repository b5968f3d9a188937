use k8s_openapi::api::core::v1::ContainerStatus;

use crate::snapshot::{ContainerRuntimeState, ContainerStatusSnapshot};

pub trait ContainerStatusExt {
    /// The active runtime state of a container, if the kubelet has reported one
    fn runtime_state(&self) -> Option<ContainerRuntimeState>;
    fn snapshot(&self) -> Option<ContainerStatusSnapshot>;
}

impl ContainerStatusExt for ContainerStatus {
    // waiting wins over running wins over terminated, mirroring how kubectl reads the state
    fn runtime_state(&self) -> Option<ContainerRuntimeState> {
        let state = self.state.as_ref()?;

        if let Some(waiting) = &state.waiting {
            return Some(ContainerRuntimeState::Waiting {
                reason: waiting.reason.clone(),
                message: waiting.message.clone(),
            });
        }
        if let Some(running) = &state.running {
            return Some(ContainerRuntimeState::Running {
                started_at: running.started_at.as_ref().map(|t| t.0),
            });
        }
        state.terminated.as_ref().map(|terminated| ContainerRuntimeState::Terminated {
            reason: terminated.reason.clone(),
            message: terminated.message.clone(),
        })
    }

    fn snapshot(&self) -> Option<ContainerStatusSnapshot> {
        Some(ContainerStatusSnapshot {
            name: self.name.clone(),
            state: self.runtime_state()?,
        })
    }
}
