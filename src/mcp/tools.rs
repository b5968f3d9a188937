//! Tool definitions and the structured (unformatted) rendering of command results.

use serde::Serialize;
use serde_json::json;

use super::protocol::{ToolDefinition, ToolsCallParams, ToolsCallResult};
use crate::dispatcher::{Arguments, CommandResult, Dispatcher, Frontend, Operation, Payload};

struct Tool {
    name: &'static str,
    operation: Operation,
    description: &'static str,
}

const TOOLS: &[Tool] = &[
    Tool {
        name: "list_pods",
        operation: Operation::ListPods,
        description: "List all pods in a namespace",
    },
    Tool {
        name: "list_deployments",
        operation: Operation::ListDeployments,
        description: "List all deployments in a namespace",
    },
    Tool {
        name: "get_pod_logs",
        operation: Operation::GetPodLogs,
        description: "Get logs from a specific pod, or its status and recent events when it is not running",
    },
    Tool {
        name: "notify_slack",
        operation: Operation::Notify,
        description: "Send a message to a Slack channel",
    },
    Tool {
        name: "get_cluster_context",
        operation: Operation::GetClusterContext,
        description: "Show the active Kubernetes context",
    },
    Tool {
        name: "list_contexts",
        operation: Operation::ListContexts,
        description: "List all known Kubernetes contexts",
    },
];

fn input_schema(operation: Operation) -> serde_json::Value {
    match operation {
        Operation::ListPods | Operation::ListDeployments => json!({
            "type": "object",
            "properties": {
                "namespace": { "type": "string", "description": "Namespace, defaults to \"default\"" },
            },
        }),
        Operation::GetPodLogs => json!({
            "type": "object",
            "properties": {
                "pod_name": { "type": "string" },
                "namespace": { "type": "string", "description": "Namespace, defaults to \"default\"" },
            },
            "required": ["pod_name"],
        }),
        Operation::Notify => json!({
            "type": "object",
            "properties": {
                "channel": { "type": "string" },
                "message": { "type": "string" },
            },
            "required": ["channel", "message"],
        }),
        Operation::GetClusterContext | Operation::ListContexts => json!({
            "type": "object",
            "properties": {},
        }),
    }
}

pub fn definitions() -> Vec<ToolDefinition> {
    TOOLS
        .iter()
        .map(|tool| ToolDefinition {
            name: tool.name.to_string(),
            description: tool.description.to_string(),
            input_schema: input_schema(tool.operation),
        })
        .collect()
}

pub fn operation_for(name: &str) -> Option<Operation> {
    TOOLS.iter().find(|tool| tool.name == name).map(|tool| tool.operation)
}

/// Run a tool. Failures come back as an error result, never as a JSON-RPC error.
pub async fn call(dispatcher: &Dispatcher, params: ToolsCallParams) -> ToolsCallResult {
    let operation = match operation_for(&params.name) {
        Some(operation) => operation,
        None => return ToolsCallResult::error(format!("Error: Unknown tool: {}", params.name)),
    };
    let arguments = Arguments::from(params.arguments.unwrap_or_default());
    let result = dispatcher.dispatch(operation, &arguments, Frontend::Tool).await;
    render(&result)
}

pub fn render(result: &CommandResult) -> ToolsCallResult {
    match result {
        Ok(payload) => ToolsCallResult::text(payload_text(payload)),
        Err(err) => ToolsCallResult::error(format!("Error: {err}")),
    }
}

/// Structured payloads as pretty JSON, text payloads as they are
pub fn payload_text(payload: &Payload) -> String {
    match payload {
        Payload::Pods { pods, .. } => to_json(pods),
        Payload::Deployments { deployments, .. } => to_json(deployments),
        Payload::Logs { text, .. } => text.clone(),
        Payload::Context(context) => to_json(context),
        Payload::Contexts(contexts) => to_json(contexts),
        Payload::Notified { channel } => format!("Message sent to {channel}"),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MockClusterApi,
        dispatcher::{testing::dispatcher, MockNotifier},
        pod::fixtures::pod,
    };
    use serde_json::Value;

    fn params(name: &str, arguments: Value) -> ToolsCallParams {
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).unwrap()
    }

    #[test]
    fn declares_required_arguments() {
        let tools = definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "list_pods",
                "list_deployments",
                "get_pod_logs",
                "notify_slack",
                "get_cluster_context",
                "list_contexts"
            ]
        );
        let logs = tools.iter().find(|t| t.name == "get_pod_logs").unwrap();
        assert_eq!(logs.input_schema["required"], json!(["pod_name"]));
        let notify = tools.iter().find(|t| t.name == "notify_slack").unwrap();
        assert_eq!(notify.input_schema["required"], json!(["channel", "message"]));
    }

    #[tokio::test]
    async fn list_pods_returns_unformatted_snapshots() {
        let mut api = MockClusterApi::new();
        api.expect_list_pods()
            .withf(|namespace: &str| namespace == "default")
            .returning(|_| Ok(vec![pod("web-1", "Running", &["nginx"])]));

        let result = call(
            &dispatcher(api, MockNotifier::new()),
            params("list_pods", json!({ "namespace": "default" })),
        )
        .await;

        assert!(result.is_error.is_none());
        let pods: Value = serde_json::from_str(result.first_text()).unwrap();
        assert_eq!(
            pods,
            json!([{
                "name": "web-1",
                "namespace": "default",
                "status": "Running",
                "containers": ["nginx"],
                "conditions": []
            }])
        );
    }

    #[tokio::test]
    async fn missing_pod_name_is_an_error_result() {
        let mut api = MockClusterApi::new();
        api.expect_get_pod().times(0);
        api.expect_pod_logs().times(0);

        let result = call(&dispatcher(api, MockNotifier::new()), params("get_pod_logs", json!({}))).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.first_text(), "Error: pod_name is required");
    }

    #[tokio::test]
    async fn arguments_may_be_absent() {
        let mut api = MockClusterApi::new();
        api.expect_list_deployments().returning(|_| Ok(Vec::new()));

        let params: ToolsCallParams = serde_json::from_value(json!({ "name": "list_deployments" })).unwrap();
        let result = call(&dispatcher(api, MockNotifier::new()), params).await;
        assert_eq!(result.first_text(), "[]");
    }

    #[tokio::test]
    async fn notify_confirms_channel() {
        let mut notifier = MockNotifier::new();
        notifier.expect_post_message().times(1).returning(|_, _| Ok(()));

        let result = call(
            &dispatcher(MockClusterApi::new(), notifier),
            params("notify_slack", json!({ "channel": "#alerts", "message": "pod web-1 restarted" })),
        )
        .await;
        assert_eq!(result, ToolsCallResult::text("Message sent to #alerts"));
    }

    #[tokio::test]
    async fn unknown_tool() {
        let result = call(
            &dispatcher(MockClusterApi::new(), MockNotifier::new()),
            params("delete_pod", json!({})),
        )
        .await;
        assert_eq!(result.first_text(), "Error: Unknown tool: delete_pod");
    }
}
