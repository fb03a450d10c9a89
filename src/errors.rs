use axum::{http::StatusCode, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
    /// Remote service failure, already reduced to a single message.
    #[error("{0}")]
    Upstream(String),
    #[error("origin denied")]
    OriginDenied,
    #[error("request too large")]
    RequestTooLarge,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("missing Mcp-Session-Id header")]
    MissingSession,
    #[error("unknown session")]
    UnknownSession,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnknownTool(_) => "UnknownTool",
            AppError::InvalidParams(_) => "InvalidParams",
            AppError::UnsupportedMethod(_) => "UnsupportedMethod",
            AppError::Upstream(_) => "UpstreamError",
            AppError::OriginDenied => "OriginDenied",
            AppError::RequestTooLarge => "RequestTooLarge",
            AppError::MethodNotAllowed => "MethodNotAllowed",
            AppError::MissingSession => "MissingSession",
            AppError::UnknownSession => "UnknownSession",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::OriginDenied => StatusCode::FORBIDDEN,
            AppError::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnknownTool(_) | AppError::UnknownSession => StatusCode::NOT_FOUND,
            AppError::InvalidParams(_) | AppError::MissingSession => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UnsupportedMethod(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON-RPC 2.0 error code used when the failure escapes a tool result.
    pub fn rpc_code(&self) -> i64 {
        match self {
            AppError::UnknownTool(_) | AppError::InvalidParams(_) => -32602,
            AppError::MissingSession | AppError::UnknownSession => -32600,
            _ => -32603,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn into_response(err: AppError) -> (StatusCode, Json<ErrorBody>) {
    let body = ErrorBody {
        code: err.code(),
        message: err.to_string(),
    };
    (err.status(), Json(body))
}
