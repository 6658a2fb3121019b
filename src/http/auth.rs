use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::state::AppState;
use crate::error::ErrorResponse;

/// Shared-secret check via the X-API-Key header.
///
/// Disabled when no `auth.api_key` is configured. Applied to every route
/// except `/` and `/health`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.config.auth.api_key.as_deref() {
        let provided = request
            .headers()
            .get("x-api-key")
            .and_then(|value| value.to_str().ok());

        if provided != Some(expected) {
            warn!("Rejected request to {} with invalid API key", request.uri());
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key. Provide X-API-Key header".to_string(),
                }),
            )
                .into_response();
        }
    }

    next.run(request).await
}
