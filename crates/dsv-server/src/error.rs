use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dsv_store::{ErrorClass, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Store(e) => match e.class() {
                ErrorClass::NotFound => StatusCode::NOT_FOUND,
                ErrorClass::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorClass::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::BadRequest(_) | ServerError::Multipart(_) => StatusCode::BAD_REQUEST,
            ServerError::Config(_) | ServerError::Io(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
