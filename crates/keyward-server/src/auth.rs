use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use constant_time_eq::constant_time_eq;
use serde_json::json;

use crate::AppState;

/// Axum middleware that validates the `Authorization` header against the
/// configured admin key. The header carries the raw secret — no scheme
/// prefix — and must match byte-for-byte.
pub async fn require_admin_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(p) if constant_time_eq(p.as_bytes(), state.admin_key.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid admin key"})),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Authorization header is required"})),
        )
            .into_response(),
    }
}
