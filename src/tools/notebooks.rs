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
            CapabilityDescriptor::new("list_notebooks", "Get all notebooks with optional filtering and ordering.")
                .tags(&["notebooks", "list", "query"])
                .optional("archived", ArgKind::Bool)
                .optional("order_by", ArgKind::Str)
                .optional("limit", ArgKind::Int)
                .returns("[notebook]")
                .example(json!({"archived": false, "order_by": "updated desc", "limit": 20}))
                .typical_bytes(2000),
            list_notebooks,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_notebook", "Get a specific notebook by ID.")
                .tags(&["notebooks", "get", "read"])
                .arg("notebook_id", ArgKind::Str)
                .returns("notebook")
                .example(json!({"notebook_id": "notebook:abc123"})),
            get_notebook,
        ),
        Operation::new(
            CapabilityDescriptor::new("create_notebook", "Create a new notebook.")
                .tags(&["notebooks", "create", "write"])
                .arg("name", ArgKind::Str)
                .optional("description", ArgKind::Str)
                .returns("notebook")
                .example(json!({"name": "My Research", "description": "AI research notebook"})),
            create_notebook,
        ),
        Operation::new(
            CapabilityDescriptor::new("update_notebook", "Update a notebook.")
                .tags(&["notebooks", "update", "write"])
                .arg("notebook_id", ArgKind::Str)
                .optional("name", ArgKind::Str)
                .optional("description", ArgKind::Str)
                .optional("archived", ArgKind::Bool)
                .returns("notebook")
                .example(json!({"notebook_id": "notebook:abc123", "name": "Updated Name"})),
            update_notebook,
        ),
        Operation::new(
            CapabilityDescriptor::new("delete_notebook", "Delete a notebook.")
                .tags(&["notebooks", "delete", "write"])
                .arg("notebook_id", ArgKind::Str)
                .returns("{message: string}")
                .example(json!({"notebook_id": "notebook:abc123"}))
                .typical_bytes(100),
            delete_notebook,
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    archived: Option<bool>,
    order_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct ListQuery<'a> {
    order_by: &'a str,
    archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct NotebookRef {
    notebook_id: String,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct NewNotebook {
    name: String,
    description: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct NotebookChanges {
    name: Option<String>,
    description: Option<String>,
    archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    notebook_id: String,
    #[serde(flatten)]
    changes: NotebookChanges,
}

fn list_notebooks(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ListArgs = parse_args(params)?;
        let limit = clamp_limit(args.limit.unwrap_or(20), LIST_LIMIT_MAX);
        let query = ListQuery {
            order_by: args.order_by.as_deref().unwrap_or("updated desc"),
            archived: args.archived,
        };
        let notebooks = ctx.dispatcher.send(ApiRequest::get("/api/notebooks").query(&query)?).await?;
        Ok(truncate(notebooks, limit))
    }
    .boxed()
}

fn get_notebook(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NotebookRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::get(resource_path("/api/notebooks", &args.notebook_id))).await
    }
    .boxed()
}

fn create_notebook(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NewNotebook = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/notebooks").json(&args)?).await
    }
    .boxed()
}

fn update_notebook(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: UpdateArgs = parse_args(params)?;
        let req = ApiRequest::put(resource_path("/api/notebooks", &args.notebook_id)).json(&args.changes)?;
        ctx.dispatcher.send(req).await
    }
    .boxed()
}

fn delete_notebook(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NotebookRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::delete(resource_path("/api/notebooks", &args.notebook_id))).await
    }
    .boxed()
}
