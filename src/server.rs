use crate::{
    config::Config,
    errors::{into_response, AppError},
    mcp::{
        registry::ToolRegistry,
        rpc,
        types::{RpcError, RpcResponse},
    },
    security,
};
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{future, stream};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info};

pub const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<ToolRegistry>,
    pub sessions: Arc<Sessions>,
}

impl AppState {
    pub fn new(cfg: Config, registry: ToolRegistry) -> Self {
        let sessions = Sessions::new(
            Duration::from_secs(cfg.limits.session_idle_s),
            cfg.limits.max_sessions,
        );
        Self {
            cfg: Arc::new(cfg),
            registry: Arc::new(registry),
            sessions: Arc::new(sessions),
        }
    }
}

/// Session ids handed out on `initialize`, with the time each was last used.
/// Only consulted when the server is not stateless. Idle sessions expire and
/// the least recently used one is evicted once `max` are open.
pub struct Sessions {
    seen: Mutex<HashMap<String, Instant>>,
    idle: Duration,
    max: usize,
}

impl Sessions {
    pub fn new(idle: Duration, max: usize) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            idle,
            max: max.max(1),
        }
    }

    pub fn open(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.retain(|_, last| now.duration_since(*last) <= self.idle);
        while seen.len() >= self.max {
            let Some(oldest) = seen.iter().min_by_key(|(_, last)| **last).map(|(k, _)| k.clone()) else {
                break;
            };
            seen.remove(&oldest);
        }
        seen.insert(id.clone(), now);
        id
    }

    pub fn close(&self, id: &str) -> bool {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// The caller's session id, refreshed. Expired ids are dropped here.
    pub fn require<'h>(&self, headers: &'h HeaderMap) -> Result<&'h str, AppError> {
        let id = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::MissingSession)?;
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = seen
            .get(id)
            .is_some_and(|last| now.duration_since(*last) <= self.idle);
        if fresh {
            seen.insert(id.to_string(), now);
            Ok(id)
        } else {
            seen.remove(id);
            Err(AppError::UnknownSession)
        }
    }
}

pub async fn serve(cfg: Config, registry: ToolRegistry) -> anyhow::Result<()> {
    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    let base = cfg.server.base_path.clone();
    let app = build_router(AppState::new(cfg, registry));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, base_path = %base, "http transport listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    let base = shared.cfg.server.base_path.clone();
    let limit_bytes = shared.cfg.limits.max_request_kb * 1024;
    Router::new()
        .route("/healthz", get(health))
        .route(
            &base,
            post(rpc_endpoint)
                .layer(RequestBodyLimitLayer::new(limit_bytes))
                .get(no_stream)
                .delete(end_session),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn no_stream() -> Response {
    into_response(AppError::MethodNotAllowed).into_response()
}

async fn rpc_endpoint(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let started = Instant::now();
    if let Err(e) = authorize(&state, &headers) {
        audit_http("POST", e.code(), started);
        return into_response(e).into_response();
    }

    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            audit_http("POST", "ParseError", started);
            let reply = RpcResponse::failure(Value::Null, RpcError::parse_error(format!("Parse error: {e}")));
            return (StatusCode::BAD_REQUEST, Json(reply)).into_response();
        }
    };

    let stateless = state.cfg.server.stateless_http;
    let is_initialize = incoming.get("method").and_then(Value::as_str) == Some("initialize");
    if !stateless && !is_initialize {
        if let Err(e) = state.sessions.require(&headers) {
            audit_http("POST", e.code(), started);
            return into_response(e).into_response();
        }
    }

    let Some(reply) = rpc::handle_message(&state.registry, incoming).await else {
        audit_http("POST", "Accepted", started);
        return StatusCode::ACCEPTED.into_response();
    };

    let session = (!stateless && is_initialize && reply.get("result").is_some()).then(|| {
        let id = state.sessions.open();
        debug!(open_sessions = state.sessions.len(), "session opened");
        id
    });
    let mut response = if state.cfg.server.json_response {
        Json(reply).into_response()
    } else {
        sse_message(&reply)
    };
    if let Some(id) = session.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, id);
    }
    audit_http("POST", "OK", started);
    response
}

async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.cfg.server.stateless_http {
        return into_response(AppError::MethodNotAllowed).into_response();
    }
    match state.sessions.require(&headers) {
        Ok(id) => {
            state.sessions.close(id);
            StatusCode::OK.into_response()
        }
        Err(e) => into_response(e).into_response(),
    }
}

// One JSON-RPC reply as a single `message` event; the stream then ends.
fn sse_message(reply: &Value) -> Response {
    match Event::default().event("message").json_data(reply) {
        Ok(event) => Sse::new(stream::once(future::ready(Ok::<_, Infallible>(event)))).into_response(),
        Err(e) => into_response(AppError::Internal(e.to_string())).into_response(),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    security::check_origin(headers, &state.cfg.server.allowed_origins)?;
    security::content_length_ok(headers, state.cfg.limits.max_request_kb)?;
    Ok(())
}

fn audit_http(method: &str, code: &str, started: Instant) {
    tracing::info!(
        transport = "http",
        method = method,
        code = code,
        duration_ms = started.elapsed().as_millis() as u64,
        "audit"
    );
}
