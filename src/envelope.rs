use crate::{errors::AppResult, mcp::types::ErrorObj};
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Exactly one of these is present in a serialized envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Result(Value),
    Error(ErrorObj),
}

/// Uniform wrapper around every operation result, built per call.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub request_id: String,
    pub operation: String,
    /// Length of the result when the remote service returned a list.
    pub count: Option<usize>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Envelope {
    pub fn new(request_id: String, operation: &str, outcome: AppResult<Value>) -> Self {
        let (count, outcome) = match outcome {
            Ok(value) => (value.as_array().map(Vec::len), Outcome::Result(value)),
            Err(err) => (None, Outcome::Error(ErrorObj::from(&err))),
        };
        Self {
            request_id,
            operation: operation.to_string(),
            count,
            outcome,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorObj> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Result(_) => None,
        }
    }
}
