#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

use crate::{
    contexts::ContextRegistry,
    error::Error,
    prometheus::DISPATCHED_COMMANDS,
    reader::ClusterReader,
    snapshot::{ContextInfo, DeploymentSnapshot, PodSnapshot},
};

pub const DEFAULT_NAMESPACE: &str = "default";

/// Posting a plain message somewhere, the one write this service does
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListPods,
    ListDeployments,
    GetPodLogs,
    GetClusterContext,
    ListContexts,
    Notify,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListPods => "list_pods",
            Operation::ListDeployments => "list_deployments",
            Operation::GetPodLogs => "get_pod_logs",
            Operation::GetClusterContext => "get_cluster_context",
            Operation::ListContexts => "list_contexts",
            Operation::Notify => "notify",
        }
    }

    /// Arguments that must be present and non-empty, checked in this order
    pub fn required_arguments(&self) -> &'static [&'static str] {
        match self {
            Operation::GetPodLogs => &["pod_name"],
            Operation::Notify => &["channel", "message"],
            _ => &[],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which front-end a command came in through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    Chat,
    Tool,
}

impl Frontend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frontend::Chat => "chat",
            Frontend::Tool => "tool",
        }
    }
}

/// Named string arguments of a command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new() -> Arguments {
        Arguments::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Arguments {
        self.0.insert(name.into(), Value::String(value.into()));
        self
    }

    /// A non-blank string argument, trimmed
    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw(name).map(str::trim)
    }

    /// A non-blank string argument exactly as given
    fn raw(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn namespace(&self) -> &str {
        self.get("namespace").unwrap_or(DEFAULT_NAMESPACE)
    }

    fn require(&self, name: &str) -> Result<&str, Error> {
        self.get(name).ok_or_else(|| Error::required(name))
    }

    fn require_raw(&self, name: &str) -> Result<&str, Error> {
        self.raw(name).ok_or_else(|| Error::required(name))
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Arguments(map)
    }
}

/// Typed output of a successful command, rendered by each front-end for its own presentation
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Pods {
        namespace: String,
        pods: Vec<PodSnapshot>,
    },
    Deployments {
        namespace: String,
        deployments: Vec<DeploymentSnapshot>,
    },
    Logs {
        pod_name: String,
        namespace: String,
        text: String,
    },
    Context(ContextInfo),
    Contexts(Vec<ContextInfo>),
    Notified {
        channel: String,
    },
}

pub type CommandResult = Result<Payload, Error>;

/// Maps an operation and its arguments onto the reader, the registry or the notifier
///
/// Stateless. Every path ends in exactly one `CommandResult`.
#[derive(Clone)]
pub struct Dispatcher {
    reader: ClusterReader,
    contexts: Arc<ContextRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(reader: ClusterReader, contexts: Arc<ContextRegistry>, notifier: Arc<dyn Notifier>) -> Dispatcher {
        Dispatcher {
            reader,
            contexts,
            notifier,
        }
    }

    pub fn reader(&self) -> &ClusterReader {
        &self.reader
    }

    pub async fn dispatch(&self, operation: Operation, arguments: &Arguments, frontend: Frontend) -> CommandResult {
        debug!("{}: dispatching {operation} {arguments:?}", frontend.as_str());
        let result = match validate(operation, arguments) {
            Ok(()) => self.invoke(operation, arguments).await,
            Err(err) => Err(err),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => {
                warn!("{}: {operation} failed: {err}", frontend.as_str());
                err.kind()
            }
        };
        DISPATCHED_COMMANDS
            .with_label_values(&[operation.as_str(), frontend.as_str(), outcome])
            .inc();
        result
    }

    async fn invoke(&self, operation: Operation, arguments: &Arguments) -> CommandResult {
        let namespace = arguments.namespace().to_string();
        match operation {
            Operation::ListPods => Ok(Payload::Pods {
                pods: self.reader.list_pods(&namespace).await?,
                namespace,
            }),
            Operation::ListDeployments => Ok(Payload::Deployments {
                deployments: self.reader.list_deployments(&namespace).await?,
                namespace,
            }),
            Operation::GetPodLogs => {
                let pod_name = arguments.require("pod_name")?.to_string();
                let text = self.reader.get_pod_logs(&pod_name, &namespace).await;
                Ok(Payload::Logs {
                    pod_name,
                    namespace,
                    text,
                })
            }
            Operation::GetClusterContext => Ok(Payload::Context(self.contexts.active_context())),
            Operation::ListContexts => Ok(Payload::Contexts(self.contexts.available_contexts())),
            Operation::Notify => {
                let channel = arguments.require("channel")?;
                // message text is posted verbatim, code fences and indentation included
                let message = arguments.require_raw("message")?;
                self.notifier
                    .post_message(channel, message)
                    .await
                    .map_err(Error::ChatDelivery)?;
                info!("{channel}: posted notification");
                Ok(Payload::Notified {
                    channel: channel.to_string(),
                })
            }
        }
    }
}

fn validate(operation: Operation, arguments: &Arguments) -> Result<(), Error> {
    for name in operation.required_arguments() {
        arguments.require(name)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::{testing::dispatcher, *};
    use crate::{api::MockClusterApi, pod::fixtures::pod, snapshot::Phase};
    use anyhow::anyhow;

    #[tokio::test]
    async fn get_pod_logs_requires_pod_name() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod().times(0);
        api.expect_list_pod_events().times(0);
        api.expect_pod_logs().times(0);

        let result = dispatcher(api, MockNotifier::new())
            .dispatch(Operation::GetPodLogs, &Arguments::new(), Frontend::Tool)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("pod_name is required"));
    }

    #[tokio::test]
    async fn blank_pod_name_counts_as_missing() {
        let result = dispatcher(MockClusterApi::new(), MockNotifier::new())
            .dispatch(Operation::GetPodLogs, &Arguments::new().with("pod_name", "  "), Frontend::Chat)
            .await;
        assert_eq!(result.unwrap_err().to_string(), "pod_name is required");
    }

    #[tokio::test]
    async fn namespace_defaults_to_default() {
        let mut api = MockClusterApi::new();
        api.expect_list_pods()
            .withf(|namespace: &str| namespace == "default")
            .times(1)
            .returning(|_| Ok(vec![pod("web-1", "Running", &["nginx"])]));

        let result = dispatcher(api, MockNotifier::new())
            .dispatch(Operation::ListPods, &Arguments::new(), Frontend::Tool)
            .await;

        match result.unwrap() {
            Payload::Pods { namespace, pods } => {
                assert_eq!(namespace, "default");
                assert_eq!(pods.len(), 1);
                assert_eq!(pods[0].phase, Phase::Running);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_failure_is_an_err_not_a_panic() {
        let mut api = MockClusterApi::new();
        api.expect_list_deployments().returning(|_| Err(anyhow!("Unauthorized")));

        let result = dispatcher(api, MockNotifier::new())
            .dispatch(
                Operation::ListDeployments,
                &Arguments::new().with("namespace", "prod"),
                Frontend::Chat,
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::ClusterUnavailable(_)));
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn notify_posts_without_touching_the_cluster() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_post_message()
            .withf(|channel: &str, text: &str| channel == "#ops" && text == "deploy finished")
            .times(1)
            .returning(|_, _| Ok(()));

        let arguments = Arguments::new().with("channel", "#ops").with("message", "deploy finished");
        let result = dispatcher(MockClusterApi::new(), notifier)
            .dispatch(Operation::Notify, &arguments, Frontend::Tool)
            .await;

        assert_eq!(
            result.unwrap(),
            Payload::Notified {
                channel: "#ops".into()
            }
        );
    }

    #[tokio::test]
    async fn notify_posts_message_verbatim() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_post_message()
            .withf(|channel: &str, text: &str| channel == "#ops" && text == "```\n  indented log line\n```\n")
            .times(1)
            .returning(|_, _| Ok(()));

        let arguments = Arguments::new()
            .with("channel", " #ops ")
            .with("message", "```\n  indented log line\n```\n");
        let result = dispatcher(MockClusterApi::new(), notifier)
            .dispatch(Operation::Notify, &arguments, Frontend::Tool)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn blank_message_counts_as_missing() {
        let mut notifier = MockNotifier::new();
        notifier.expect_post_message().times(0);

        let arguments = Arguments::new().with("channel", "#ops").with("message", " \n ");
        let result = dispatcher(MockClusterApi::new(), notifier)
            .dispatch(Operation::Notify, &arguments, Frontend::Tool)
            .await;
        assert_eq!(result.unwrap_err().to_string(), "message is required");
    }

    #[tokio::test]
    async fn notify_requires_channel_first() {
        let mut notifier = MockNotifier::new();
        notifier.expect_post_message().times(0);

        let result = dispatcher(MockClusterApi::new(), notifier)
            .dispatch(Operation::Notify, &Arguments::new(), Frontend::Tool)
            .await;
        assert_eq!(result.unwrap_err().to_string(), "channel is required");
    }

    #[tokio::test]
    async fn notify_delivery_failure() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_post_message()
            .returning(|_, _| Err(anyhow!("channel_not_found")));

        let arguments = Arguments::new().with("channel", "#nope").with("message", "hi");
        let err = dispatcher(MockClusterApi::new(), notifier)
            .dispatch(Operation::Notify, &arguments, Frontend::Tool)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChatDelivery(_)));
    }

    #[tokio::test]
    async fn context_operations_use_the_registry() {
        let d = dispatcher(MockClusterApi::new(), MockNotifier::new());

        let active = d
            .dispatch(Operation::GetClusterContext, &Arguments::new(), Frontend::Chat)
            .await
            .unwrap();
        assert!(matches!(active, Payload::Context(ref c) if c.name == "in-cluster"));

        let all = d
            .dispatch(Operation::ListContexts, &Arguments::new(), Frontend::Chat)
            .await
            .unwrap();
        assert!(matches!(all, Payload::Contexts(ref c) if c.len() == 1));
    }
}
