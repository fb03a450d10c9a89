//! JSON-RPC 2.0 routing shared by the stdio and HTTP transports.

use crate::{
    errors::AppError,
    mcp::{
        registry::ToolRegistry,
        types::{CallParams, RpcError, RpcResponse, JSONRPC_VERSION, SUPPORTED_PROTOCOL_VERSIONS},
    },
};
use serde_json::{json, Value};

pub const SERVER_NAME: &str = "notebook-mcp";

const INSTRUCTIONS: &str = "Call search_capabilities with detail='name' to see what exists, \
then detail='full' for the operations you intend to call. Every result is an envelope \
with request_id and exactly one of result or error.";

/// Handle one raw line or body. `None` means nothing should be written back.
pub async fn handle_raw(registry: &ToolRegistry, raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(incoming) => handle_message(registry, incoming).await,
        Err(e) => Some(parse_failure(e)),
    }
}

/// -32700 reply with a null id, for input that never became a message.
pub fn parse_failure(err: impl std::fmt::Display) -> Value {
    reply(RpcResponse::failure(
        Value::Null,
        RpcError::parse_error(format!("Parse error: {err}")),
    ))
}

pub async fn handle_message(registry: &ToolRegistry, incoming: Value) -> Option<Value> {
    let Some(obj) = incoming.as_object() else {
        return Some(reply(RpcResponse::failure(
            Value::Null,
            RpcError::invalid_request("Request must be a JSON object"),
        )));
    };
    let id = obj.get("id").cloned();
    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Some(reply(RpcResponse::failure(
            id.unwrap_or(Value::Null),
            RpcError::invalid_request("jsonrpc must be '2.0'"),
        )));
    }
    // Responses to requests we never send.
    let Some(method) = obj.get("method").and_then(Value::as_str) else {
        return None;
    };
    let params = obj.get("params").cloned().unwrap_or(Value::Null);

    // Notifications get no reply.
    let id = id?;
    let response = match handle_request(registry, method, params).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(err) => RpcResponse::failure(id, err),
    };
    Some(reply(response))
}

async fn handle_request(registry: &ToolRegistry, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(initialize_payload(&params)),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": registry.tool_infos() })),
        "tools/call" => tools_call(registry, params).await,
        _ => Err(RpcError::method_not_found(method)),
    }
}

fn initialize_payload(params: &Value) -> Value {
    let requested = params.get("protocolVersion").and_then(Value::as_str);
    let version = requested
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]);
    json!({
        "protocolVersion": version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": INSTRUCTIONS,
    })
}

async fn tools_call(registry: &ToolRegistry, params: Value) -> Result<Value, RpcError> {
    let call: CallParams = serde_json::from_value(params)
        .map_err(|e| RpcError::invalid_params(format!("tools/call: {e}")))?;
    let envelope = registry
        .invoke(&call.name, call.arguments)
        .await
        .map_err(RpcError::from)?;
    let structured = serde_json::to_value(&envelope).map_err(|e| RpcError::from(AppError::Internal(e.to_string())))?;
    let text = serde_json::to_string_pretty(&structured).unwrap_or_default();
    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
        "isError": envelope.is_error(),
    }))
}

fn reply(response: RpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}
