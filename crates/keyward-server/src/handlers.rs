use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{store::LicenseKey, AppState};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_keys(State(state): State<AppState>) -> Response {
    match state.store.list() {
        Ok(keys) => Json(keys).into_response(),
        Err(e) => internal_error(e),
    }
}

// ── Get ───────────────────────────────────────────────────────────────────────

pub async fn get_key(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.store.get(id) {
        Ok(Some(key)) => Json(key).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "key not found"})),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

// ── Create ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub key: String,
}

pub async fn create_key(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Response {
    // Any malformed body (bad JSON, wrong shape) surfaces as a JSON 400
    // rather than the extractor's default plain-text rejection.
    let Json(body) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": rejection.body_text()})),
            )
                .into_response();
        }
    };

    match state.store.insert(&body.key) {
        Ok(id) => {
            info!(id, "created key");
            (StatusCode::CREATED, Json(LicenseKey { id, key: body.key })).into_response()
        }
        Err(e) => internal_error(e),
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_key(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    // Deleting an absent id still reports success — the store delete is
    // idempotent and unconditional.
    match state.store.delete(id) {
        Ok(existed) => {
            info!(id, existed, "deleted key");
            Json(json!({"message": "key deleted"})).into_response()
        }
        Err(e) => internal_error(e),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_id(raw: &str) -> Result<i64, Response> {
    raw.parse().map_err(|_| {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid id"}))).into_response()
    })
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!(error = %e, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal server error"})),
    )
        .into_response()
}
