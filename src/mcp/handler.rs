//! JSON-RPC method dispatch for the tool endpoint.
//!
//! Each HTTP request carries one message; the endpoint keeps no session state.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use super::{
    prompts,
    protocol::{
        methods, InitializeResult, McpError, McpRequest, McpResponse, PromptsGetParams, PromptsListResult,
        ResourcesListResult, ResourcesReadParams, ResourcesReadResult, ServerCapabilities, ServerInfo,
        ToolsCallParams, ToolsListResult, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
    },
    resources, tools,
};
use crate::dispatcher::Dispatcher;

pub const SERVER_NAME: &str = "kubernetes-slack-bridge";

/// Handle one raw message. `None` means a notification that gets no response body.
pub async fn handle_message(dispatcher: &Dispatcher, body: &[u8]) -> Option<McpResponse> {
    let request: McpRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => return Some(McpResponse::error(None, McpError::ParseError(e.to_string()))),
    };
    debug!("tool endpoint: {} (id {:?})", request.method, request.id);

    // notifications never get a reply, whatever the method
    if request.id.is_none() {
        return None;
    }
    if request.jsonrpc != JSONRPC_VERSION {
        return Some(McpResponse::error(
            request.id,
            McpError::InvalidRequest(format!("unsupported jsonrpc version {:?}", request.jsonrpc)),
        ));
    }

    let result = match request.method.as_str() {
        methods::INITIALIZE => to_value(initialize()),
        methods::PING => Ok(json!({})),
        methods::TOOLS_LIST => to_value(ToolsListResult {
            tools: tools::definitions(),
        }),
        methods::TOOLS_CALL => match params::<ToolsCallParams>(&request) {
            Ok(params) => to_value(tools::call(dispatcher, params).await),
            Err(e) => Err(e),
        },
        methods::RESOURCES_LIST => match resources::list(dispatcher).await {
            Ok(resources) => to_value(ResourcesListResult { resources }),
            Err(e) => Err(e.into()),
        },
        methods::RESOURCES_READ => match params::<ResourcesReadParams>(&request) {
            Ok(params) => match resources::read(dispatcher, &params.uri).await {
                Ok(content) => to_value(ResourcesReadResult {
                    contents: vec![content],
                }),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        },
        methods::PROMPTS_LIST => to_value(PromptsListResult {
            prompts: prompts::definitions(),
        }),
        methods::PROMPTS_GET => match params::<PromptsGetParams>(&request) {
            Ok(params) => prompts::get(dispatcher, params).await.and_then(to_value),
            Err(e) => Err(e),
        },
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    Some(match result {
        Ok(value) => McpResponse::success(request.id, value),
        Err(e) => McpResponse::error(request.id, e),
    })
}

fn initialize() -> InitializeResult {
    InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: json!({}),
            resources: json!({}),
            prompts: json!({}),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}

fn params<T: DeserializeOwned>(request: &McpRequest) -> Result<T, McpError> {
    let params = request
        .params
        .clone()
        .ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn to_value<T: Serialize>(result: T) -> Result<Value, McpError> {
    serde_json::to_value(result).map_err(|e| {
        error!("Failed to serialize tool endpoint result: {e}");
        McpError::InternalError(e.to_string())
    })
}
