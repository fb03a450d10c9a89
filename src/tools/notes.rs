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
            CapabilityDescriptor::new("list_notes", "Get all notes with optional filtering.")
                .tags(&["notes", "list", "query"])
                .optional("notebook_id", ArgKind::Str)
                .optional("limit", ArgKind::Int)
                .optional("offset", ArgKind::Int)
                .returns("[note]")
                .example(json!({"notebook_id": "notebook:abc123", "limit": 20, "offset": 0}))
                .typical_bytes(2000),
            list_notes,
        ),
        Operation::new(
            CapabilityDescriptor::new("get_note", "Get a specific note by ID.")
                .tags(&["notes", "get", "read"])
                .arg("note_id", ArgKind::Str)
                .returns("note")
                .example(json!({"note_id": "note:abc123"}))
                .typical_bytes(1500),
            get_note,
        ),
        Operation::new(
            CapabilityDescriptor::new("create_note", "Create a new note.")
                .tags(&["notes", "create", "write"])
                .arg("notebook_id", ArgKind::Str)
                .arg("title", ArgKind::Str)
                .arg("content", ArgKind::Str)
                .optional("topics", ArgKind::StrList)
                .returns("note")
                .example(json!({"notebook_id": "notebook:abc123", "title": "My Note", "content": "Note content"}))
                .typical_bytes(1500),
            create_note,
        ),
        Operation::new(
            CapabilityDescriptor::new("update_note", "Update a note.")
                .tags(&["notes", "update", "write"])
                .arg("note_id", ArgKind::Str)
                .optional("title", ArgKind::Str)
                .optional("content", ArgKind::Str)
                .optional("topics", ArgKind::StrList)
                .returns("note")
                .example(json!({"note_id": "note:abc123", "title": "Updated Title"}))
                .typical_bytes(1500),
            update_note,
        ),
        Operation::new(
            CapabilityDescriptor::new("delete_note", "Delete a note.")
                .tags(&["notes", "delete", "write"])
                .arg("note_id", ArgKind::Str)
                .returns("{message: string}")
                .example(json!({"note_id": "note:abc123"}))
                .typical_bytes(100),
            delete_note,
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    notebook_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    offset: Option<i64>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct ListQuery {
    limit: usize,
    offset: i64,
    notebook_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoteRef {
    note_id: String,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct NewNote {
    notebook_id: String,
    title: String,
    content: String,
    topics: Option<Vec<String>>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize)]
struct NoteChanges {
    title: Option<String>,
    content: Option<String>,
    topics: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    note_id: String,
    #[serde(flatten)]
    changes: NoteChanges,
}

fn list_notes(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: ListArgs = parse_args(params)?;
        let query = ListQuery {
            limit: clamp_limit(args.limit.unwrap_or(20), LIST_LIMIT_MAX),
            offset: args.offset.unwrap_or(0).max(0),
            notebook_id: args.notebook_id,
        };
        let notes = ctx.dispatcher.send(ApiRequest::get("/api/notes").query(&query)?).await?;
        Ok(truncate(notes, query.limit))
    }
    .boxed()
}

fn get_note(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NoteRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::get(resource_path("/api/notes", &args.note_id))).await
    }
    .boxed()
}

fn create_note(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NewNote = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::post("/api/notes").json(&args)?).await
    }
    .boxed()
}

fn update_note(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: UpdateArgs = parse_args(params)?;
        let req = ApiRequest::put(resource_path("/api/notes", &args.note_id)).json(&args.changes)?;
        ctx.dispatcher.send(req).await
    }
    .boxed()
}

fn delete_note(ctx: ToolContext, params: Value) -> BoxFuture<'static, AppResult<Value>> {
    async move {
        let args: NoteRef = parse_args(params)?;
        ctx.dispatcher.send(ApiRequest::delete(resource_path("/api/notes", &args.note_id))).await
    }
    .boxed()
}
