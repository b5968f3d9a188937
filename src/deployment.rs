use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;

use crate::snapshot::DeploymentSnapshot;

/// Extension trait for `Deployment`
pub trait DeploymentSnapshotExt {
    fn snapshot(&self) -> DeploymentSnapshot;
}

impl DeploymentSnapshotExt for Deployment {
    fn snapshot(&self) -> DeploymentSnapshot {
        // the apiserver defaults spec.replicas to 1
        let desired_replicas = self.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1).max(0);
        let available_replicas = self.status.as_ref().and_then(|s| s.available_replicas);

        DeploymentSnapshot {
            name: self.name_any(),
            namespace: self.namespace().unwrap_or_else(|| "default".into()),
            desired_replicas,
            available_replicas,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
    use kube::api::ObjectMeta;

    pub fn deployment(name: &str, replicas: i32, available: Option<i32>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("default".into()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                available_replicas: available,
                ..Default::default()
            }),
        }
    }
}
