//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Request bodies are single cafe records.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/cafes",
            get(handlers::list_cafes).post(handlers::create_cafe),
        )
        .route("/all", get(handlers::all_cafes))
        .route("/random", get(handlers::random_cafe))
        .route("/search", get(handlers::search_cafes))
        .route(
            "/cafe/{id}",
            get(handlers::get_cafe).delete(handlers::delete_cafe),
        )
        .route("/cafe/{id}/price", patch(handlers::update_price))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
