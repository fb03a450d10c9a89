//! Outbound calls to the remote notebook service.
//!
//! Every operation handler funnels through [`Dispatcher::dispatch`], which
//! attaches auth, bounds the wait, and reduces every failure to
//! [`AppError::Upstream`] carrying one message string. No retries.

use crate::{
    config::{Api, Limits},
    errors::{AppError, AppResult},
};
use reqwest::{header::CONTENT_TYPE, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    fn method(self) -> Method {
        match self {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Delete => Method::DELETE,
        }
    }

    fn carries_body(self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put)
    }
}

impl FromStr for HttpVerb {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpVerb::Get),
            "POST" => Ok(HttpVerb::Post),
            "PUT" => Ok(HttpVerb::Put),
            "DELETE" => Ok(HttpVerb::Delete),
            _ => Err(AppError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// A call against the remote service, built from an operation's typed
/// arguments. Unset optional arguments never reach `body` or `query`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub verb: HttpVerb,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self { Self::new(HttpVerb::Get, path) }
    pub fn post(path: impl Into<String>) -> Self { Self::new(HttpVerb::Post, path) }
    pub fn put(path: impl Into<String>) -> Self { Self::new(HttpVerb::Put, path) }
    pub fn delete(path: impl Into<String>) -> Self { Self::new(HttpVerb::Delete, path) }

    pub fn json<T: Serialize>(mut self, body: &T) -> AppResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| AppError::Internal(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query<T: Serialize>(mut self, params: &T) -> AppResult<Self> {
        let value = serde_json::to_value(params).map_err(|e| AppError::Internal(e.to_string()))?;
        self.query = query_pairs(value)?;
        Ok(self)
    }
}

fn query_pairs(value: Value) -> AppResult<Vec<(String, String)>> {
    let Value::Object(map) = value else {
        return Err(AppError::Internal("query parameters must be an object".into()));
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}

/// Cheap to clone; clones share the HTTP client.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<Api>,
    client: reqwest::Client,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(api: &Api, limits: &Limits) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(limits.request_timeout_s);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api: Arc::new(api.clone()),
            client,
            timeout,
        })
    }

    pub async fn send(&self, req: ApiRequest) -> AppResult<Value> {
        self.dispatch(req.verb, &req.path, req.body.as_ref(), &req.query).await
    }

    pub async fn dispatch(
        &self,
        verb: HttpVerb,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> AppResult<Value> {
        let url = format!("{}{}", self.api.base_url.trim_end_matches('/'), path);
        let mut request = self
            .client
            .request(verb.method(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.api.token.as_deref() {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let (true, Some(body)) = (verb.carries_body(), body) {
            let bytes = serde_json::to_vec(body).map_err(|e| AppError::Internal(e.to_string()))?;
            request = request.body(bytes);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(self.transport_message(&e)))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(self.transport_message(&e)))?;
        debug!(method = %verb, path = path, status = status.as_u16(), bytes = bytes.len(), "upstream call");

        if !status.is_success() {
            return Err(AppError::Upstream(failure_message(status, &url, &bytes)));
        }
        parse_success(&bytes)
    }

    fn transport_message(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else {
            err.to_string()
        }
    }
}

/// Empty 2xx bodies become `{"message": "Success"}`.
pub fn parse_success(bytes: &[u8]) -> AppResult<Value> {
    if bytes.is_empty() {
        return Ok(json!({"message": "Success"}));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::Upstream(format!("invalid JSON in response: {e}")))
}

/// `detail` from a JSON error body, else the raw body text, else a generic
/// status line.
pub fn failure_message(status: StatusCode, url: &str, bytes: &[u8]) -> String {
    if let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(bytes) {
        match body.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    let text = String::from_utf8_lossy(bytes);
    if !text.trim().is_empty() {
        return text.into_owned();
    }
    format!("HTTP {status} for url {url}")
}
