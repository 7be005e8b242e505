//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer in `db::services`.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{
    ApiKeyQuery, CafeListResponse, CafeResponse, CafesResponse, CreateCafeRequest,
    HealthResponse, MessageResponse, PriceQuery, SearchQuery,
};
use super::error::AppError;
use super::extract::{JsonOrForm, QueryParams};
use super::state::AppState;
use crate::db::repository::cafe::describe_oversized;
use crate::db::services as db_services;
use crate::models::{exceeds_limit, CafeId, MAX_TEXT_CHARS};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Parse the `{id}` path segment. Anything that is not an id names no cafe.
fn parse_id(raw: &str) -> Result<CafeId, AppError> {
    raw.parse::<i32>()
        .map(CafeId::new)
        .map_err(|_| AppError::cafe_not_found())
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Reads
// =============================================================================

/// GET /cafes
///
/// All cafes ordered by name, with a count. No cafes is an empty list.
pub async fn list_cafes(State(state): State<AppState>) -> HandlerResult<CafeListResponse> {
    let cafes = db_services::list_cafes(state.repository.as_ref()).await?;
    let total = cafes.len();
    Ok(Json(CafeListResponse { cafes, total }))
}

/// GET /all
pub async fn all_cafes(State(state): State<AppState>) -> HandlerResult<CafesResponse> {
    let cafes = db_services::list_cafes(state.repository.as_ref()).await?;
    Ok(Json(CafesResponse { cafes }))
}

/// GET /random
pub async fn random_cafe(State(state): State<AppState>) -> HandlerResult<CafeResponse> {
    match db_services::random_cafe(state.repository.as_ref()).await? {
        Some(cafe) => Ok(Json(CafeResponse { cafe })),
        None => Err(AppError::no_cafes()),
    }
}

/// GET /search?loc=
///
/// Exact match on location. Unlike `/cafes`, no match is a 404.
pub async fn search_cafes(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> HandlerResult<CafesResponse> {
    let location = query
        .loc
        .ok_or_else(|| AppError::BadRequest("Missing required query parameter 'loc'".into()))?;

    let cafes = db_services::search_by_location(state.repository.as_ref(), &location).await?;
    if cafes.is_empty() {
        return Err(AppError::location_not_found());
    }
    Ok(Json(CafesResponse { cafes }))
}

/// GET /cafe/{id}
pub async fn get_cafe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<CafeResponse> {
    let id = parse_id(&id)?;
    let cafe = db_services::get_cafe(state.repository.as_ref(), id).await?;
    Ok(Json(CafeResponse { cafe }))
}

// =============================================================================
// Mutations
// =============================================================================

/// POST /cafes
///
/// Accepts JSON or form fields. Answers 201 with a `Location` header.
pub async fn create_cafe(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<CreateCafeRequest>,
) -> Result<Response, AppError> {
    let candidate = request.validate()?;
    let cafe = db_services::create_cafe(state.repository.as_ref(), &candidate).await?;

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/cafe/{}", cafe.id))],
        Json(MessageResponse::success("Successfully added the new cafe.")),
    )
        .into_response())
}

/// PATCH /cafe/{id}/price?new_price=
pub async fn update_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<PriceQuery>,
) -> HandlerResult<MessageResponse> {
    let new_price = query.new_price.ok_or_else(|| {
        AppError::BadRequest("Missing required query parameter 'new_price'".into())
    })?;
    if exceeds_limit(&new_price, MAX_TEXT_CHARS) {
        return Err(AppError::BadRequest(describe_oversized(&[(
            "new_price",
            MAX_TEXT_CHARS,
        )])));
    }
    let id = parse_id(&id)?;

    db_services::update_price(state.repository.as_ref(), id, &new_price).await?;
    Ok(Json(MessageResponse::success(
        "Successfully updated the price.",
    )))
}

/// DELETE /cafe/{id}?api_key=
///
/// The key is checked before the store is touched, so a wrong key is a 403
/// whether or not the cafe exists. A query string that does not parse carries
/// no usable key and is refused the same way.
pub async fn delete_cafe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ApiKeyQuery>, QueryRejection>,
) -> HandlerResult<MessageResponse> {
    let api_key = query.ok().and_then(|Query(query)| query.api_key);
    if !state.api_key.matches(api_key.as_deref()) {
        return Err(AppError::forbidden());
    }
    let id = parse_id(&id)?;

    db_services::delete_cafe(state.repository.as_ref(), id).await?;
    Ok(Json(MessageResponse::success(
        "Successfully deleted the cafe from the database.",
    )))
}

/// Fallback for unknown paths, keeping the error envelope.
pub async fn not_found() -> AppError {
    AppError::NotFound("The requested URL was not found on the server.".to_string())
}
