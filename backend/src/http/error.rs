//! HTTP error handling and response types.
//!
//! Every failure is rendered as `{"error": {"<reason phrase>": "<message>"}}`,
//! e.g. `{"error": {"Not Found": "Sorry, a cafe with that id was not found in the database."}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::db::repository::RepositoryError;

pub const CAFE_NOT_FOUND: &str = "Sorry, a cafe with that id was not found in the database.";
pub const LOCATION_NOT_FOUND: &str = "Sorry, we don't have a cafe at that location.";
pub const NO_CAFES: &str = "Sorry, there are no cafes in the database yet.";
pub const WRONG_API_KEY: &str =
    "Sorry, that's not allowed. Make sure you have the correct api_key.";
const STORAGE_FAILURE: &str = "The database could not complete the request.";

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Mutation secret missing or wrong
    Forbidden(String),
    /// Request body in a format the endpoint does not read
    UnsupportedMediaType(String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn cafe_not_found() -> Self {
        AppError::NotFound(CAFE_NOT_FOUND.to_string())
    }

    pub fn location_not_found() -> Self {
        AppError::NotFound(LOCATION_NOT_FOUND.to_string())
    }

    pub fn no_cafes() -> Self {
        AppError::NotFound(NO_CAFES.to_string())
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden(WRONG_API_KEY.to_string())
    }

    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            AppError::Repository(err) => match err {
                // The only lookup the store can miss is a cafe id.
                RepositoryError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, CAFE_NOT_FOUND.to_string())
                }
                RepositoryError::DuplicateName { name, .. } => (
                    StatusCode::CONFLICT,
                    format!("A cafe named '{}' already exists.", name),
                ),
                RepositoryError::ValidationError { message, .. } => {
                    (StatusCode::BAD_REQUEST, message)
                }
                other => {
                    tracing::error!(error = %other, "store operation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        STORAGE_FAILURE.to_string(),
                    )
                }
            },
        }
    }
}

/// Build the error envelope for `status`.
pub fn error_body(status: StatusCode, message: &str) -> Value {
    let category = status.canonical_reason().unwrap_or("Error");
    let mut detail = Map::new();
    detail.insert(category.to_string(), Value::from(message));
    json!({ "error": detail })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(error_body(status, &message))).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}
