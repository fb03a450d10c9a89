use super::parse_args;
use crate::{
    catalog::{ArgKind, CapabilityDescriptor},
    dispatch::ApiRequest,
    errors::AppResult,
    mcp::registry::{Operation, ToolContext},
};
use futures::{future::BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            CapabilityDescriptor::new("get_settings", "Get application settings.")
                .tags(&["settings", "get", "config"])
                .returns("settings")
                .typical_bytes(1000),
            get_settings,
        ),
        Operation::new(
            CapabilityDescriptor::new("update_settings", "Update application settings.")
                .tags(&["settings", "update", "write", "config"])
                .arg("settings", ArgKind::Object)
                .returns("settings")
                .example(json!({"settings": {"theme": "dark"}}))
                .typical_bytes(1000),
            update_settings,
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    settings: Map<String, Value>,
}

fn get_settings(ctx: ToolContext, _params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move { ctx.dispatcher.send(ApiRequest::get("/api/settings")).await }.boxed()
}

// The settings object is the request body as-is.
fn update_settings(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: UpdateArgs = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::put("/api/settings").json(&args.settings)?).await
    }
    .boxed()
}
