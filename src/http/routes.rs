use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth;
use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // Body limit slightly above the configured file limit so the explicit
    // validation check produces the 413, with a useful message, first.
    let body_limit = state.config.limits.max_file_size_bytes() + 64 * 1024;

    // Everything except `/` and `/health` sits behind the API key check.
    let protected = Router::new()
        .route("/transcribe", post(handlers::transcribe_audio))
        .route("/transcribe/streaming", post(handlers::start_streaming))
        .route(
            "/transcribe/streaming/chunk",
            post(handlers::process_streaming_chunk),
        )
        .route(
            "/transcribe/streaming/finalize",
            post(handlers::finalize_streaming),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
