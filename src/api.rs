#[cfg(test)]
use mockall::automock;

use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Event, Pod},
};
use kube::{
    api::{Api, ListParams, LogParams},
    Client,
};
use tracing::debug;

use crate::events::involved_object_selector;

/// Raw reads against the cluster control plane
///
/// Every call is a fresh round trip. Implementations hold nothing but the client handle.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<Pod>>;
    async fn list_deployments(&self, namespace: &str) -> anyhow::Result<Vec<Deployment>>;
    async fn get_pod(&self, name: &str, namespace: &str) -> anyhow::Result<Pod>;
    /// Events whose involved object carries the given name
    async fn list_pod_events(&self, name: &str, namespace: &str) -> anyhow::Result<Vec<Event>>;
    async fn pod_logs(&self, name: &str, namespace: &str) -> anyhow::Result<String>;
}

/// `ClusterApi` backed by a `kube::Client`
#[derive(Clone)]
pub struct KubeApi {
    client: Client,
}

impl KubeApi {
    pub fn new(client: Client) -> KubeApi {
        KubeApi { client }
    }

    // namespaced apis are cheap, they only wrap the client and a url prefix
    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterApi for KubeApi {
    async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<Pod>> {
        debug!("{namespace}: listing pods");
        let pods = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("listing pods in {namespace}"))?;
        Ok(pods.items)
    }

    async fn list_deployments(&self, namespace: &str) -> anyhow::Result<Vec<Deployment>> {
        debug!("{namespace}: listing deployments");
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployments = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("listing deployments in {namespace}"))?;
        Ok(deployments.items)
    }

    async fn get_pod(&self, name: &str, namespace: &str) -> anyhow::Result<Pod> {
        debug!("{name}: reading pod in {namespace}");
        self.pods(namespace)
            .get(name)
            .await
            .with_context(|| format!("reading pod {name} in {namespace}"))
    }

    async fn list_pod_events(&self, name: &str, namespace: &str) -> anyhow::Result<Vec<Event>> {
        debug!("{name}: listing events in {namespace}");
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().fields(&involved_object_selector(name));
        let events = api
            .list(&lp)
            .await
            .with_context(|| format!("listing events for {name} in {namespace}"))?;
        Ok(events.items)
    }

    async fn pod_logs(&self, name: &str, namespace: &str) -> anyhow::Result<String> {
        debug!("{name}: fetching logs in {namespace}");
        self.pods(namespace)
            .logs(name, &LogParams::default())
            .await
            .with_context(|| format!("fetching logs for {name} in {namespace}"))
    }
}
