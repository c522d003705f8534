use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    auth::require_admin_key,
    handlers::{create_key, delete_key, get_key, list_keys},
    AppState,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret every request must present.
    pub admin_key: String,
    /// Database file. Resolved against the platform data dir when absent.
    pub database_path: Option<PathBuf>,
    pub cors_origins: Option<String>,
}

impl ServerConfig {
    /// Build from a loaded config file plus environment overrides for the
    /// listen address.
    pub fn from_config(cfg: crate::Config) -> Self {
        Self {
            host: std::env::var("KEYWARD_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("KEYWARD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            admin_key: cfg.admin_key,
            database_path: cfg.database_path,
            cors_origins: std::env::var("KEYWARD_CORS_ORIGINS").ok(),
        }
    }
}

/// Build the application router. The admin-key middleware layers the whole
/// router, fallback included, so every path and method is gated — there are
/// no public routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/keys", get(list_keys))
        .route("/api/keys", post(create_key))
        .route("/api/keys/{id}", get(get_key))
        .route("/api/keys/{id}", delete(delete_key))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_key,
        ))
        .with_state(state)
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    if cfg.admin_key.is_empty() {
        anyhow::bail!("admin key must not be empty");
    }

    // Resolve the database location.
    let db_path = match cfg.database_path {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).context("create database dir")?;
            }
            p
        }
        None => crate::dirs::data_dir()?.join("keyward.db"),
    };
    info!(db = %db_path.display(), "using key database");

    let store = crate::store::Store::open(&db_path).context("open store")?;

    let state = AppState {
        store,
        admin_key: cfg.admin_key,
    };

    let cors = build_cors(cfg.cors_origins.as_deref());

    let app = router(state).layer(cors).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "keyward server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app).await.context("server error")
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<_> = o.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}
