pub mod auth;
pub mod config;
pub mod dirs;
pub mod handlers;
pub mod server;
pub mod store;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: store::Store,
    /// Shared secret every request must present in `Authorization`.
    pub admin_key: String,
}

pub use config::Config;
pub use server::{router, run, ServerConfig};
