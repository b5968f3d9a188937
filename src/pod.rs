use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

use crate::{
    container::ContainerStatusExt,
    snapshot::{Condition, ContainerStatusSnapshot, EventSnapshot, Phase, PodSnapshot},
};

/// Public extension trait for `Pod`
pub trait PodSnapshotExt {
    /// Flatten a `Pod` into the list form of a `PodSnapshot` (no statuses, no events)
    fn snapshot(&self) -> PodSnapshot;
    /// Flatten a `Pod` together with its events into the full form of a `PodSnapshot`
    fn detailed_snapshot(&self, events: Vec<EventSnapshot>) -> PodSnapshot;
}

/// Extension trait for `Pod`
///
/// Only used in the PodSnapshotExt trait
trait PodParts {
    fn phase(&self) -> Phase;
    /// Names of the declared containers, in spec order
    fn container_names(&self) -> Vec<String>;
    fn conditions(&self) -> Vec<Condition>;
    /// Runtime states of declared containers that have reported one
    fn container_statuses(&self) -> Vec<ContainerStatusSnapshot>;
}

impl PodSnapshotExt for Pod {
    fn snapshot(&self) -> PodSnapshot {
        PodSnapshot {
            name: self.name_any(),
            namespace: self.namespace().unwrap_or_else(|| "default".into()),
            phase: self.phase(),
            containers: self.container_names(),
            conditions: self.conditions(),
            container_statuses: None,
            events: None,
        }
    }

    fn detailed_snapshot(&self, events: Vec<EventSnapshot>) -> PodSnapshot {
        PodSnapshot {
            container_statuses: Some(self.container_statuses()),
            events: Some(events),
            ..self.snapshot()
        }
    }
}

impl PodParts for Pod {
    fn phase(&self) -> Phase {
        Phase::parse(self.status.as_ref().and_then(|s| s.phase.as_deref()))
    }

    fn container_names(&self) -> Vec<String> {
        match &self.spec {
            Some(spec) => spec.containers.iter().map(|c| c.name.clone()).collect(),
            None => Vec::new(),
        }
    }

    fn conditions(&self) -> Vec<Condition> {
        let conditions = match self.status.as_ref().and_then(|s| s.conditions.as_ref()) {
            Some(conditions) => conditions,
            None => return Vec::new(),
        };
        conditions
            .iter()
            .map(|c| Condition {
                type_: c.type_.clone(),
                status: c.status.clone(),
                message: c.message.clone(),
            })
            .collect()
    }

    fn container_statuses(&self) -> Vec<ContainerStatusSnapshot> {
        let statuses = match self.status.as_ref().and_then(|s| s.container_statuses.as_ref()) {
            Some(statuses) => statuses,
            // nothing scheduled yet
            None => return Vec::new(),
        };
        let declared = self.container_names();
        statuses
            .iter()
            .filter(|s| declared.contains(&s.name))
            .filter_map(|s| s.snapshot())
            .collect()
    }
}
