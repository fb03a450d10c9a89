use super::{lenient_int, parse_args, resource_path, truncate, LIST_LIMIT_MAX};
use crate::{
    catalog::{clamp_limit, ArgKind, CapabilityDescriptor},
    dispatch::ApiRequest,
    errors::AppResult,
    mcp::registry::{Operation, ToolContext},
};
use futures::{future::BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::skip_serializing_none;

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            CapabilityDescriptor::new("list_sources", "Get all sources with optional filtering.")
                .tags(&["sources", "list", "query"])
                .optional("notebook_id", ArgKind::Str)
                .optional("limit", ArgKind::Int)
                .optional("offset", ArgKind::Int)
                .returns("[source]")
                .example(json!({"notebook_id": "notebook:abc123", "limit": 20, "offset": 0}))
                .typical_bytes(3000),
            list_sources,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_source", "Get a specific source by ID.")
                .tags(&["sources", "get", "read"])
                .arg("source_id", ArgKind::Str)
                .returns("source")
                .example(json!({"source_id": "source:abc123"}))
                .typical_bytes(2000),
            get_source,
        ),
        Operation::new(
            CapabilityDescriptor::new("create_source", "Create a new source (link, upload, or text).")
                .tags(&["sources", "create", "write"])
                .arg("notebook_id", ArgKind::Str)
                .arg("type", ArgKind::Str)
                .optional("url", ArgKind::Str)
                .optional("title", ArgKind::Str)
                .optional("embed", ArgKind::Bool)
                .returns("source")
                .example(json!({
                    "notebook_id": "notebook:abc123",
                    "type": "link",
                    "url": "https://example.com",
                    "embed": true
                }))
                .typical_bytes(2000),
            create_source,
        ),
        Operation::new(
            CapabilityDescriptor::new("update_source", "Update a source.")
                .tags(&["sources", "update", "write"])
                .arg("source_id", ArgKind::Str)
                .optional("title", ArgKind::Str)
                .optional("topics", ArgKind::StrList)
                .returns("source")
                .example(json!({"source_id": "source:abc123", "title": "New Title"}))
                .typical_bytes(2000),
            update_source,
        ),
        Operation::new(
            CapabilityDescriptor::new("delete_source", "Delete a source.")
                .tags(&["sources", "delete", "write"])
                .arg("source_id", ArgKind::Str)
                .returns("{message: string}")
                .example(json!({"source_id": "source:abc123"}))
                .typical_bytes(100),
            delete_source,
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    notebook_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    offset: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct ListQuery {
    limit: usize,
    offset: i64,
    notebook_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceRef {
    source_id: String,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct NewSource {
    notebook_id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_embed")]
    embed: bool,
    url: Option<String>,
    title: Option<String>,
}
fn default_embed() -> bool { true }

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct SourceChanges {
    title: Option<String>,
    topics: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    source_id: String,
    #[serde(flatten)]
    changes: SourceChanges,
}

fn list_sources(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ListArgs = parse_args(params)?;
        let query = ListQuery {
            limit: clamp_limit(args.limit.unwrap_or(20), LIST_LIMIT_MAX),
            offset: args.offset.unwrap_or(0).max(0),
            notebook_id: args.notebook_id,
        };
        let sources = ctx.dispatcher.send(ApiRequest::get("/api/sources").query(&query)?).await?;
        Ok(truncate(sources, query.limit))
    }
    .boxed()
}

fn get_source(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: SourceRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::get(resource_path("/api/sources", &args.source_id))).await
    }
    .boxed()
}

fn create_source(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NewSource = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/sources").json(&args)?).await
    }
    .boxed()
}

fn update_source(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: UpdateArgs = parse_args(params)?;
        let req = ApiRequest::put(resource_path("/api/sources", &args.source_id)).json(&args.changes)?;
        ctx.dispatcher.send(req).await
    }
    .boxed()
}

fn delete_source(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: SourceRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::delete(resource_path("/api/sources", &args.source_id))).await
    }
    .boxed()
}
