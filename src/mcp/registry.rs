use crate::{
    catalog::{Catalog, CapabilityDescriptor},
    dispatch::Dispatcher,
    envelope::Envelope,
    errors::{AppError, AppResult},
    mcp::types::ToolInfo,
};
use futures::future::BoxFuture;
use serde_json::Value;
use std::{sync::Arc, time::Instant};

/// Everything a handler may touch. Cloned into each call.
#[derive(Clone)]
pub struct ToolContext {
    pub dispatcher: Dispatcher,
    pub catalog: Arc<Catalog>,
}

pub type Handler = fn(ToolContext, Value) -> BoxFuture<'static, AppResult<Value>>;

pub struct Operation {
    pub descriptor: CapabilityDescriptor,
    pub handler: Handler,
}

impl Operation {
    pub fn new(descriptor: CapabilityDescriptor, handler: Handler) -> Self {
        Self { descriptor, handler }
    }
}

/// Operation name to handler, plus the catalog describing each one. Built
/// once at startup and never modified.
#[derive(Clone)]
pub struct ToolRegistry {
    catalog: Arc<Catalog>,
    handlers: Vec<(&'static str, Handler)>,
    dispatcher: Dispatcher,
}

impl ToolRegistry {
    pub fn new(dispatcher: Dispatcher) -> anyhow::Result<Self> {
        Self::with_operations(dispatcher, crate::tools::operations())
    }

    pub fn with_operations(dispatcher: Dispatcher, operations: Vec<Operation>) -> anyhow::Result<Self> {
        let mut handlers: Vec<(&'static str, Handler)> =
            operations.iter().map(|op| (op.descriptor.name, op.handler)).collect();
        handlers.sort_by(|a, b| a.0.cmp(b.0));
        let catalog = Catalog::new(operations.into_iter().map(|op| op.descriptor).collect())?;
        Ok(Self {
            catalog: Arc::new(catalog),
            handlers,
            dispatcher,
        })
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers
            .binary_search_by(|(n, _)| (*n).cmp(name))
            .ok()
            .map(|i| self.handlers[i].1)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tool_infos(&self) -> Vec<ToolInfo> {
        self.catalog
            .iter()
            .map(|d| ToolInfo {
                name: d.name.to_string(),
                description: d.summary.to_string(),
                input_schema: d.args.input_schema(),
            })
            .collect()
    }

    /// Run one operation. Only an unknown name is an `Err`; every failure of
    /// a known operation comes back inside the envelope.
    pub async fn invoke(&self, name: &str, params: Value) -> AppResult<Envelope> {
        let started = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let Some(handler) = self.get(name) else {
            let err = AppError::UnknownTool(name.to_string());
            audit(&request_id, name, "deny", err.code(), started, 0);
            return Err(err);
        };
        let ctx = ToolContext {
            dispatcher: self.dispatcher.clone(),
            catalog: self.catalog.clone(),
        };
        let envelope = Envelope::new(request_id, name, handler(ctx, params).await);
        let bytes_out = serde_json::to_vec(&envelope).map(|v| v.len()).unwrap_or(0) as u64;
        match envelope.error() {
            Some(err) => audit(&envelope.request_id, name, "error", &err.code, started, bytes_out),
            None => audit(&envelope.request_id, name, "ok", "OK", started, bytes_out),
        }
        Ok(envelope)
    }
}

fn audit(request_id: &str, tool: &str, outcome: &str, code: &str, started: Instant, bytes_out: u64) {
    tracing::info!(
        request_id = request_id,
        tool = tool,
        outcome = outcome,
        code = code,
        duration_ms = started.elapsed().as_millis() as u64,
        bytes_out = bytes_out,
        "audit"
    );
}
