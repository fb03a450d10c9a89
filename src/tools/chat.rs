use super::{lenient_int, parse_args, resource_path, truncate, LIST_LIMIT_MAX};
use crate::{
    catalog::{clamp_limit, ArgKind, CapabilityDescriptor},
    dispatch::ApiRequest,
    errors::AppResult,
    mcp::registry::{Operation, ToolContext},
};
use futures::{future::BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            CapabilityDescriptor::new("list_chat_sessions", "Get all chat sessions with optional filtering.")
                .tags(&["chat", "sessions", "list"])
                .optional("notebook_id", ArgKind::Str)
                .optional("limit", ArgKind::Int)
                .returns("[session]")
                .example(json!({"notebook_id": "notebook:abc123", "limit": 20}))
                .typical_bytes(2000),
            list_chat_sessions,
        ),
        Operation::new(
            CapabilityDescriptor::new("create_chat_session", "Create a new chat session.")
                .tags(&["chat", "sessions", "create", "write"])
                .arg("notebook_id", ArgKind::Str)
                .arg("title", ArgKind::Str)
                .returns("session")
                .example(json!({"notebook_id": "notebook:abc123", "title": "Research Discussion"})),
            create_chat_session,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_chat_session", "Get a specific chat session by ID.")
                .tags(&["chat", "sessions", "get", "read"])
                .arg("session_id", ArgKind::Str)
                .returns("session with message history")
                .example(json!({"session_id": "session:abc123"}))
                .typical_bytes(3000),
            get_chat_session,
        ),
        Operation::new(
            CapabilityDescriptor::new("update_chat_session", "Update a chat session.")
                .tags(&["chat", "sessions", "update", "write"])
                .arg("session_id", ArgKind::Str)
                .optional("title", ArgKind::Str)
                .returns("session")
                .example(json!({"session_id": "session:abc123", "title": "Updated Title"})),
            update_chat_session,
        ),
        Operation::new(
            CapabilityDescriptor::new("delete_chat_session", "Delete a chat session.")
                .tags(&["chat", "sessions", "delete", "write"])
                .arg("session_id", ArgKind::Str)
                .returns("{message: string}")
                .example(json!({"session_id": "session:abc123"}))
                .typical_bytes(100),
            delete_chat_session,
        ),
        Operation::new(
            CapabilityDescriptor::new("execute_chat", "Send a message in a chat session.")
                .tags(&["chat", "execute", "message", "ai"])
                .arg("session_id", ArgKind::Str)
                .arg("message", ArgKind::Str)
                .optional("context", ArgKind::Object)
                .returns("chat response with AI message")
                .example(json!({"session_id": "session:abc123", "message": "What are the key insights?"}))
                .typical_bytes(3000),
            execute_chat,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_chat_context", "Build context for a chat conversation.")
                .tags(&["chat", "context", "build"])
                .arg("notebook_id", ArgKind::Str)
                .optional("context_config", ArgKind::Object)
                .returns("built context")
                .example(json!({"notebook_id": "notebook:abc123"}))
                .typical_bytes(5000),
            get_chat_context,
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    notebook_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct ListQuery {
    notebook_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionRef {
    session_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct NewSession {
    notebook_id: String,
    title: String,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct SessionChanges {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    session_id: String,
    #[serde(flatten)]
    changes: SessionChanges,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct ExecuteArgs {
    session_id: String,
    message: String,
    context: Option<Map<String, Value>>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct ContextArgs {
    notebook_id: String,
    context_config: Option<Map<String, Value>>,
}

fn list_chat_sessions(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ListArgs = parse_args(params)?;
        let limit = clamp_limit(args.limit.unwrap_or(20), LIST_LIMIT_MAX);
        let query = ListQuery { notebook_id: args.notebook_id };
        let sessions = ctx.dispatcher.send(ApiRequest::get("/api/chat/sessions").query(&query)?).await?;
        Ok(truncate(sessions, limit))
    }
    .boxed()
}

fn create_chat_session(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NewSession = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/chat/sessions").json(&args)?).await
    }
    .boxed()
}

fn get_chat_session(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: SessionRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::get(resource_path("/api/chat/sessions", &args.session_id))).await
    }
    .boxed()
}

fn update_chat_session(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: UpdateArgs = parse_args(params)?;
        let req = ApiRequest::put(resource_path("/api/chat/sessions", &args.session_id)).json(&args.changes)?;
        ctx.dispatcher.send(req).await
    }
    .boxed()
}

fn delete_chat_session(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: SessionRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::delete(resource_path("/api/chat/sessions", &args.session_id))).await
    }
    .boxed()
}

fn execute_chat(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ExecuteArgs = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/chat/execute").json(&args)?).await
    }
    .boxed()
}

fn get_chat_context(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ContextArgs = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/chat/context").json(&args)?).await
    }
    .boxed()
}
