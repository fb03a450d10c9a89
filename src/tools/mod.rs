pub mod chat;
pub mod discovery;
pub mod models;
pub mod notebooks;
pub mod notes;
pub mod search;
pub mod settings;
pub mod sources;

use crate::{
    errors::{AppError, AppResult},
    mcp::registry::Operation,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Upper bound for `limit` on list operations.
pub const LIST_LIMIT_MAX: i64 = 100;

/// The full operation table, one entry per catalog descriptor.
pub fn operations() -> Vec<Operation> {
    let mut ops = discovery::operations();
    ops.extend(notebooks::operations());
    ops.extend(sources::operations());
    ops.extend(notes::operations());
    ops.extend(search::operations());
    ops.extend(models::operations());
    ops.extend(chat::operations());
    ops.extend(settings::operations());
    ops
}

/// Decode tool arguments; a missing argument object counts as `{}`.
pub fn parse_args<T: DeserializeOwned>(params: Value) -> AppResult<T> {
    let params = if params.is_null() { Value::Object(Default::default()) } else { params };
    serde_json::from_value(params).map_err(|e| AppError::InvalidParams(e.to_string()))
}

/// Keep at most `limit` items when the remote service answered with a list.
pub fn truncate(value: Value, limit: usize) -> Value {
    match value {
        Value::Array(mut items) => {
            items.truncate(limit);
            Value::Array(items)
        }
        other => other,
    }
}

/// Decode an optional integer argument without rejecting out-of-range values.
/// Anything numeric saturates into `i64`; callers clamp afterwards.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Number>::deserialize(deserializer)?.map(|n| {
        if let Some(i) = n.as_i64() {
            i
        } else if n.as_u64().is_some() {
            i64::MAX
        } else {
            // `as` saturates and maps NaN to 0.
            n.as_f64().map_or(0, |f| f as i64)
        }
    }))
}

/// `{prefix}/{id}` with the id percent-encoded as a single path segment.
pub fn resource_path(prefix: &str, id: &str) -> String {
    format!("{prefix}/{}", urlencoding::encode(id))
}
