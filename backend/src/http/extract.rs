//! Extractors whose rejections use the API error envelope.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form, Json,
};
use serde::de::DeserializeOwned;

use super::error::AppError;

/// Deserializes the body as JSON or `application/x-www-form-urlencoded`,
/// chosen by the `Content-Type` header.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

fn media_type(req: &Request) -> String {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let media_type = media_type(&req);

        if media_type == "application/json" || media_type.ends_with("+json") {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            return Ok(Self(value));
        }

        if media_type == "application/x-www-form-urlencoded" {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            return Ok(Self(value));
        }

        Err(AppError::UnsupportedMediaType(
            "Expected a JSON or form-encoded request body".to_string(),
        ))
    }
}

/// `Query<T>` with a malformed query string reported as a 400 envelope.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
