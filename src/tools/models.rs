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

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            CapabilityDescriptor::new("list_models", "Get all configured AI models.")
                .tags(&["models", "list", "ai"])
                .optional("limit", ArgKind::Int)
                .returns("[model]")
                .example(json!({"limit": 50}))
                .typical_bytes(2000),
            list_models,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_model", "Get a specific model by ID.")
                .tags(&["models", "get", "read", "ai"])
                .arg("model_id", ArgKind::Str)
                .returns("model")
                .example(json!({"model_id": "model:abc123"})),
            get_model,
        ),
        Operation::new(
            CapabilityDescriptor::new("create_model", "Create a new AI model configuration.")
                .tags(&["models", "create", "write", "ai"])
                .arg("name", ArgKind::Str)
                .arg("provider", ArgKind::Str)
                .arg("type", ArgKind::Str)
                .returns("model")
                .example(json!({"name": "gpt-4", "provider": "openai", "type": "language"})),
            create_model,
        ),
        Operation::new(
            CapabilityDescriptor::new("delete_model", "Delete a model configuration.")
                .tags(&["models", "delete", "write", "ai"])
                .arg("model_id", ArgKind::Str)
                .returns("{message: string}")
                .example(json!({"model_id": "model:abc123"}))
                .typical_bytes(100),
            delete_model,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_default_models", "Get default model configurations.")
                .tags(&["models", "defaults", "ai"])
                .returns("default model assignments")
                .typical_bytes(1000),
            get_default_models,
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ModelRef {
    model_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct NewModel {
    name: String,
    provider: String,
    #[serde(rename = "type")]
    kind: String,
}

fn list_models(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ListArgs = parse_args(params)?;
        let limit = clamp_limit(args.limit.unwrap_or(50), LIST_LIMIT_MAX);
        let models = ctx.dispatcher.send(ApiRequest::get("/api/models")).await?;
        Ok(truncate(models, limit))
    }
    .boxed()
}

fn get_model(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ModelRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::get(resource_path("/api/models", &args.model_id))).await
    }
    .boxed()
}

fn create_model(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NewModel = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/models").json(&args)?).await
    }
    .boxed()
}

fn delete_model(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ModelRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::delete(resource_path("/api/models", &args.model_id))).await
    }
    .boxed()
}

fn get_default_models(ctx: ToolContext, _params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move { ctx.dispatcher.send(ApiRequest::get("/api/models/defaults")).await }.boxed()
}
