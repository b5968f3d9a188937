//! `k8s://<pods|deployments>/<namespace>/<name>` resources.

use std::{fmt, str::FromStr};

use super::{
    protocol::{ResourceContent, ResourceDefinition},
    tools::payload_text,
};
use crate::{
    dispatcher::{Arguments, Dispatcher, Frontend, Operation, DEFAULT_NAMESPACE},
    error::Error,
};

pub const URI_SCHEME: &str = "k8s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Pods,
    Deployments,
}

impl ResourceKind {
    fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pods => "pods",
            ResourceKind::Deployments => "deployments",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl FromStr for ResourceUri {
    type Err = Error;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let (scheme, path) = uri
            .split_once("://")
            .ok_or_else(|| Error::Validation(format!("Invalid URI format: {uri}")))?;
        if scheme != URI_SCHEME {
            return Err(Error::Validation(format!("Unsupported URI scheme: {scheme}")));
        }

        let segments: Vec<&str> = path.split('/').collect();
        let [kind, namespace, name] = segments[..] else {
            return Err(Error::Validation(format!("Invalid URI format: {uri}")));
        };
        if namespace.is_empty() || name.is_empty() {
            return Err(Error::Validation(format!("Invalid URI format: {uri}")));
        }
        let kind = match kind {
            "pods" => ResourceKind::Pods,
            "deployments" => ResourceKind::Deployments,
            other => return Err(Error::Validation(format!("Unsupported resource type: {other}"))),
        };

        Ok(ResourceUri {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URI_SCHEME}://{}/{}/{}", self.kind.as_str(), self.namespace, self.name)
    }
}

/// Every pod and deployment in the default namespace
pub async fn list(dispatcher: &Dispatcher) -> Result<Vec<ResourceDefinition>, Error> {
    let reader = dispatcher.reader();
    let pods = reader.list_pods(DEFAULT_NAMESPACE).await?;
    let deployments = reader.list_deployments(DEFAULT_NAMESPACE).await?;

    let pods = pods.into_iter().map(|pod| ResourceDefinition {
        uri: ResourceUri {
            kind: ResourceKind::Pods,
            namespace: pod.namespace.clone(),
            name: pod.name.clone(),
        }
        .to_string(),
        name: format!("Pod: {}", pod.name),
        description: format!("Kubernetes pod in namespace {}", pod.namespace),
        mime_type: "text/plain".into(),
    });
    let deployments = deployments.into_iter().map(|deployment| ResourceDefinition {
        uri: ResourceUri {
            kind: ResourceKind::Deployments,
            namespace: deployment.namespace.clone(),
            name: deployment.name.clone(),
        }
        .to_string(),
        name: format!("Deployment: {}", deployment.name),
        description: format!("Kubernetes deployment in namespace {}", deployment.namespace),
        mime_type: "application/json".into(),
    });
    Ok(pods.chain(deployments).collect())
}

/// A pod reads as its logs (or status report), a deployment as its namespace's deployment list
pub async fn read(dispatcher: &Dispatcher, uri: &str) -> Result<ResourceContent, Error> {
    let resource: ResourceUri = uri.parse()?;

    let (operation, arguments, mime_type) = match resource.kind {
        ResourceKind::Pods => (
            Operation::GetPodLogs,
            Arguments::new()
                .with("pod_name", resource.name.as_str())
                .with("namespace", resource.namespace.as_str()),
            "text/plain",
        ),
        ResourceKind::Deployments => (
            Operation::ListDeployments,
            Arguments::new().with("namespace", resource.namespace.as_str()),
            "application/json",
        ),
    };
    let payload = dispatcher.dispatch(operation, &arguments, Frontend::Tool).await?;

    Ok(ResourceContent {
        uri: uri.to_string(),
        mime_type: mime_type.to_string(),
        text: payload_text(&payload),
    })
}
