use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    api::ClusterApi,
    deployment::DeploymentSnapshotExt,
    error::Error,
    pod::PodSnapshotExt,
    snapshot::{DeploymentSnapshot, EventSnapshot, PodSnapshot},
};

/// How many of the most recent events a status report shows
pub const RECENT_EVENTS: usize = 5;

/// Read model over the cluster
///
/// Holds no snapshot state, every call re-fetches from the control plane.
#[derive(Clone)]
pub struct ClusterReader {
    api: Arc<dyn ClusterApi>,
}

impl ClusterReader {
    pub fn new(api: Arc<dyn ClusterApi>) -> ClusterReader {
        ClusterReader { api }
    }

    pub async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSnapshot>, Error> {
        let pods = self.api.list_pods(namespace).await.map_err(Error::ClusterUnavailable)?;
        Ok(pods.iter().map(|p| p.snapshot()).collect())
    }

    pub async fn list_deployments(&self, namespace: &str) -> Result<Vec<DeploymentSnapshot>, Error> {
        let deployments = self
            .api
            .list_deployments(namespace)
            .await
            .map_err(Error::ClusterUnavailable)?;
        Ok(deployments.iter().map(|d| d.snapshot()).collect())
    }

    /// The full form of a pod: conditions, container statuses and events
    ///
    /// The pod and its events are two separate reads, merged here.
    pub async fn get_pod_detail(&self, name: &str, namespace: &str) -> Result<PodSnapshot, Error> {
        let (pod, events) = futures::try_join!(
            self.api.get_pod(name, namespace),
            self.api.list_pod_events(name, namespace)
        )
        .map_err(|err| {
            warn!("{name}: could not read pod detail: {err:#}");
            Error::ClusterUnavailable(err)
        })?;

        let events: Vec<EventSnapshot> = events.iter().map(EventSnapshot::from).collect();
        Ok(pod.detailed_snapshot(events))
    }

    /// Logs of a running pod, or a status report for anything else
    ///
    /// Never fails: any error becomes a readable line, since the caller always has to show something.
    pub async fn get_pod_logs(&self, name: &str, namespace: &str) -> String {
        let pod = match self.get_pod_detail(name, namespace).await {
            Ok(pod) => pod,
            Err(err) => return format!("Error getting logs: {err}"),
        };

        if !pod.is_running() {
            // a crash-looping or pending container has no useful logs, show why instead
            debug!("{name}: is {}, reporting status instead of logs", pod.phase);
            return status_report(&pod);
        }

        match self.api.pod_logs(name, namespace).await {
            Ok(logs) => logs,
            Err(err) => {
                warn!("{name}: could not fetch logs: {err:#}");
                format!("Error getting logs: {}", Error::ClusterUnavailable(err))
            }
        }
    }
}

/// The tail of an event list, at most `RECENT_EVENTS` long
pub fn recent_events(events: &[EventSnapshot]) -> &[EventSnapshot] {
    &events[events.len().saturating_sub(RECENT_EVENTS)..]
}

/// Human readable phase, container states and recent events of a pod
pub fn status_report(pod: &PodSnapshot) -> String {
    let mut lines = vec![format!("Pod Status: {}", pod.phase)];

    lines.push("\nContainer Statuses:".into());
    for status in pod.container_statuses.iter().flatten() {
        let mut line = format!("• {}: {}", status.name, status.state.label());
        if let Some(reason) = status.state.reason().filter(|r| !r.is_empty()) {
            line.push_str(&format!(" ({reason})"));
        }
        if let Some(message) = status.state.message().filter(|m| !m.is_empty()) {
            line.push_str(&format!("\n  Message: {message}"));
        }
        lines.push(line);
    }

    lines.push("\nRecent Events:".into());
    let events = pod.events.as_deref().unwrap_or_default();
    for event in recent_events(events) {
        lines.push(format!("• [{}] {}: {}", event.type_, event.reason, event.message));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MockClusterApi,
        deployment::fixtures::deployment,
        pod::fixtures::{pod, with_running, with_waiting},
    };
    use anyhow::anyhow;
    use k8s_openapi::api::core::v1::Event;

    fn event(reason: &str) -> Event {
        Event {
            type_: Some("Warning".into()),
            reason: Some(reason.into()),
            message: Some(format!("{reason} happened")),
            ..Default::default()
        }
    }

    fn reader(api: MockClusterApi) -> ClusterReader {
        ClusterReader::new(Arc::new(api))
    }

    #[tokio::test]
    async fn non_running_pod_never_fetches_logs() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod()
            .withf(|name: &str, namespace: &str| name == "web-1" && namespace == "default")
            .times(1)
            .returning(|_, _| {
                Ok(with_waiting(
                    pod("web-1", "Pending", &["nginx"]),
                    "nginx",
                    "CrashLoopBackOff",
                    Some("back-off 5m0s restarting failed container"),
                ))
            });
        api.expect_list_pod_events()
            .times(1)
            .returning(|_, _| Ok(vec![event("BackOff")]));
        api.expect_pod_logs().times(0);

        let report = reader(api).get_pod_logs("web-1", "default").await;

        assert!(report.starts_with("Pod Status: Pending"));
        assert_eq!(
            report,
            "Pod Status: Pending\n\
             \nContainer Statuses:\n\
             • nginx: waiting (CrashLoopBackOff)\n  Message: back-off 5m0s restarting failed container\n\
             \nRecent Events:\n\
             • [Warning] BackOff: BackOff happened"
        );
    }

    #[tokio::test]
    async fn running_pod_returns_logs_verbatim() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod()
            .returning(|_, _| Ok(with_running(pod("web-1", "Running", &["nginx"]), "nginx")));
        api.expect_list_pod_events().returning(|_, _| Ok(Vec::new()));
        api.expect_pod_logs()
            .times(1)
            .returning(|_, _| Ok("GET / 200\nGET /healthz 200\n".into()));

        let logs = reader(api).get_pod_logs("web-1", "default").await;
        assert_eq!(logs, "GET / 200\nGET /healthz 200\n");
    }

    #[tokio::test]
    async fn status_report_keeps_last_five_events() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod().returning(|_, _| Ok(pod("job-1", "Failed", &["worker"])));
        api.expect_list_pod_events()
            .returning(|_, _| Ok((1..=7).map(|i| event(&format!("E{i}"))).collect()));
        api.expect_pod_logs().times(0);

        let report = reader(api).get_pod_logs("job-1", "batch").await;

        assert!(report.starts_with("Pod Status: Failed"));
        assert!(!report.contains("E1 happened"));
        assert!(!report.contains("E2 happened"));
        for i in 3..=7 {
            assert!(report.contains(&format!("[Warning] E{i}: E{i} happened")));
        }
    }

    #[tokio::test]
    async fn detail_failure_becomes_text() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod().returning(|_, _| Err(anyhow!("pods \"nope\" not found")));
        api.expect_list_pod_events().returning(|_, _| Ok(Vec::new()));
        api.expect_pod_logs().times(0);

        let logs = reader(api).get_pod_logs("nope", "default").await;
        assert!(logs.starts_with("Error getting logs:"));
        assert!(logs.contains("not found"));
    }

    #[tokio::test]
    async fn log_fetch_failure_becomes_text() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod().returning(|_, _| Ok(pod("web-1", "Running", &["nginx"])));
        api.expect_list_pod_events().returning(|_, _| Ok(Vec::new()));
        api.expect_pod_logs().returning(|_, _| Err(anyhow!("container is not valid")));

        let logs = reader(api).get_pod_logs("web-1", "default").await;
        assert_eq!(logs, "Error getting logs: cluster unavailable: container is not valid");
    }

    #[tokio::test]
    async fn detail_merges_pod_and_events() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod()
            .times(1)
            .returning(|_, _| Ok(with_running(pod("web-1", "Running", &["nginx"]), "nginx")));
        api.expect_list_pod_events()
            .withf(|name: &str, _: &str| name == "web-1")
            .times(1)
            .returning(|_, _| Ok(vec![event("Pulled"), event("Started")]));

        let detail = reader(api).get_pod_detail("web-1", "default").await.unwrap();
        assert_eq!(detail.container_statuses.unwrap().len(), 1);
        let reasons: Vec<String> = detail.events.unwrap().into_iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec!["Pulled", "Started"]);
    }

    #[tokio::test]
    async fn list_failure_is_cluster_unavailable() {
        let mut api = MockClusterApi::new();
        api.expect_list_pods().returning(|_| Err(anyhow!("connection refused")));

        let err = reader(api).list_pods("default").await.unwrap_err();
        assert!(matches!(err, Error::ClusterUnavailable(_)));
    }

    #[tokio::test]
    async fn lists_deployments() {
        let mut api = MockClusterApi::new();
        api.expect_list_deployments()
            .withf(|namespace: &str| namespace == "prod")
            .returning(|_| Ok(vec![deployment("api", 2, Some(2)), deployment("worker", 1, None)]));

        let deployments = reader(api).list_deployments("prod").await.unwrap();
        assert_eq!(deployments.len(), 2);
        assert!(deployments[0].fully_available());
        assert_eq!(deployments[1].available_replicas, None);
    }

    #[test]
    fn recent_events_of_short_list() {
        let events = vec![EventSnapshot {
            type_: "Normal".into(),
            reason: "Scheduled".into(),
            message: "assigned".into(),
            timestamp: None,
        }];
        assert_eq!(recent_events(&events).len(), 1);
        assert!(recent_events(&[]).is_empty());
    }
}
