use super::{lenient_int, parse_args};
use crate::{
    catalog::{clamp_limit, ArgKind, CapabilityDescriptor, DetailLevel, SearchResult, MAX_SEARCH_LIMIT},
    errors::{AppError, AppResult},
    mcp::registry::{Operation, ToolContext},
};
use futures::{future::BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub fn operations() -> Vec<Operation> {
    vec![Operation::new(
        CapabilityDescriptor::new(
            "search_capabilities",
            "Search tools exposed by this server with progressive detail levels.",
        )
        .tags(&["meta", "discovery", "progressive-disclosure"])
        .optional("query", ArgKind::Str)
        .optional("detail", ArgKind::Str)
        .optional("limit", ArgKind::Int)
        .returns("{query: string, detail: string, limit: integer, matches: [capability], count: integer, hint: string}")
        .example(json!({"query": "notebook", "detail": "summary", "limit": 10}))
        .typical_bytes(1200),
        search_capabilities,
    )]
}

// Absent and null arguments both take the default.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: Option<String>,
    detail: Option<DetailLevel>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

/// The search result alongside the parameters it was computed from, with
/// defaults applied and the limit clamped.
#[derive(Debug, Serialize)]
struct Discovery<'a> {
    query: &'a str,
    detail: DetailLevel,
    limit: usize,
    #[serde(flatten)]
    found: SearchResult<'a>,
}

fn search_capabilities(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: SearchArgs = parse_args(params)?;
        let query = args.query.as_deref().unwrap_or("");
        let detail = args.detail.unwrap_or_default();
        let limit = args.limit.unwrap_or(20);
        let discovery = Discovery {
            query,
            detail,
            limit: clamp_limit(limit, MAX_SEARCH_LIMIT),
            found: ctx.catalog.search(query, detail, limit),
        };
        serde_json::to_value(discovery).map_err(|e| AppError::Internal(e.to_string()))
    }
    .boxed()
}
