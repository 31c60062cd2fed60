use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,

    #[error("Bad request")]
    BadRequest,

    #[error("Unprocessable entry")]
    Unprocessable,

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// HTTP status this error surfaces as. Store failures count as
    /// unprocessable input rather than server faults.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Config(_) | ApiError::Toml(_) | ApiError::Json(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Fixed client-facing message per status code. Internal error detail
/// (query text, io messages) never leaves the process.
pub fn error_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        404 => "Resource Not found",
        405 => "Method Not Allowed",
        422 => "Unprocessable entry",
        500 => "Internal Server Error",
        _ => status.canonical_reason().unwrap_or("Internal Server Error"),
    }
}

/// Builds the uniform error envelope for a status code.
pub fn error_response(status: StatusCode) -> Response {
    let body = Json(serde_json::json!({
        "success": false,
        "error": status.as_u16(),
        "message": error_message(status),
    }));
    (status, body).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(self.status_code())
    }
}
