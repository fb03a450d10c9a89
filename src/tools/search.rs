use super::{lenient_int, parse_args, truncate};
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

const SEARCH_LIMIT_MAX: i64 = 50;

pub fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            CapabilityDescriptor::new("search", "Search content using vector or text search.")
                .tags(&["search", "query", "vector"])
                .arg("query", ArgKind::Str)
                .optional("type", ArgKind::Str)
                .optional("notebook_id", ArgKind::Str)
                .optional("limit", ArgKind::Int)
                .returns("search results")
                .example(json!({"query": "AI research", "type": "vector", "limit": 10}))
                .typical_bytes(3000),
            search,
        ),
        Operation::new(
            ask_descriptor("ask_question", "Ask a question about your content with detailed control.")
                .tags(&["search", "ask", "ai", "question"])
                .returns("answer with sources and reasoning")
                .example(json!({
                    "question": "What are the main AI applications?",
                    "strategy_model": "model:abc",
                    "answer_model": "model:abc",
                    "final_answer_model": "model:abc"
                }))
                .typical_bytes(5000),
            ask_question,
        ),
        Operation::new(
            ask_descriptor("ask_simple", "Ask a question about your content with simplified interface.")
                .tags(&["search", "ask", "ai", "question", "simple"])
                .returns("answer")
                .example(json!({
                    "question": "Summarize my AI research",
                    "strategy_model": "model:abc",
                    "answer_model": "model:abc",
                    "final_answer_model": "model:abc"
                }))
                .typical_bytes(4000),
            ask_simple,
        ),
    ]
}

fn ask_descriptor(name: &'static str, summary: &'static str) -> CapabilityDescriptor {
    CapabilityDescriptor::new(name, summary)
        .arg("question", ArgKind::Str)
        .arg("strategy_model", ArgKind::Str)
        .arg("answer_model", ArgKind::Str)
        .arg("final_answer_model", ArgKind::Str)
        .optional("notebook_id", ArgKind::Str)
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    notebook_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct SearchBody {
    query: String,
    #[serde(rename = "type")]
    kind: String,
    limit: usize,
    notebook_id: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct AskArgs {
    question: String,
    strategy_model: String,
    answer_model: String,
    final_answer_model: String,
    notebook_id: Option<String>,
}

fn search(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: SearchArgs = parse_args(params)?;
        let body = SearchBody {
            query: args.query,
            kind: args.kind.unwrap_or_else(|| "vector".to_string()),
            limit: clamp_limit(args.limit.unwrap_or(10), SEARCH_LIMIT_MAX),
            notebook_id: args.notebook_id,
        };
        let results = ctx.dispatcher.send(ApiRequest::post("/api/search").json(&body)?).await?;
        Ok(truncate(results, body.limit))
    }
    .boxed()
}

fn ask_question(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    ask(ctx, params, "/api/search/ask").boxed()
}

fn ask_simple(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    ask(ctx, params, "/api/search/ask/simple").boxed()
}

async fn ask(ctx: ToolContext, params: Value, path: &'static str) -> AppResult<Value> {
    let args: AskArgs = parse_args(params)?;
    ctx.dispatcher.send(ApiRequest::post(path).json(&args)?).await
}
