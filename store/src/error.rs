use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures reported by a `TodoStore`.
///
/// Each variant maps to one HTTP status so handlers can return
/// `Result<_, StoreError>` directly.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("todo {0} not found")]
    NotFound(i64),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "store request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "store request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
