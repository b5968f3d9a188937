use super::protocol::{
    GetPromptResult, McpError, PromptArgument, PromptDefinition, PromptMessage, PromptsGetParams, ToolResultContent,
};
use crate::{
    dispatcher::{Arguments, Dispatcher, Frontend, Operation, Payload},
    snapshot::PodSnapshot,
};

pub const MONITOR_PODS: &str = "monitor-pods";

pub fn definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: MONITOR_PODS.into(),
        description: "Analyze the state of the pods in a namespace".into(),
        arguments: vec![PromptArgument {
            name: "namespace".into(),
            description: "Namespace to analyze, defaults to \"default\"".into(),
            required: false,
        }],
    }]
}

pub async fn get(dispatcher: &Dispatcher, params: PromptsGetParams) -> Result<GetPromptResult, McpError> {
    if params.name != MONITOR_PODS {
        return Err(McpError::InvalidParams(format!("Unknown prompt: {}", params.name)));
    }

    let arguments = Arguments::from(params.arguments.unwrap_or_default());
    let payload = dispatcher
        .dispatch(Operation::ListPods, &arguments, Frontend::Tool)
        .await?;
    let Payload::Pods { namespace, pods } = payload else {
        return Err(McpError::InternalError("unexpected payload for list_pods".into()));
    };

    Ok(GetPromptResult {
        description: format!("Pod status analysis for namespace {namespace}"),
        messages: vec![PromptMessage {
            role: "user".into(),
            content: ToolResultContent::Text {
                text: monitor_pods_text(&namespace, &pods),
            },
        }],
    })
}

fn monitor_pods_text(namespace: &str, pods: &[PodSnapshot]) -> String {
    let mut text = format!("Analyze the current state of pods in namespace {namespace}:\n");
    for pod in pods {
        text.push_str(&format!(
            "\n- Pod {} is {} with containers: {}",
            pod.name,
            pod.phase,
            pod.containers.join(", ")
        ));
    }
    text
}
