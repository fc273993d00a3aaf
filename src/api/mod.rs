use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmUserService, UserService};
use crate::token::TokenCodec;

pub mod auth;
mod error;

pub use error::ApiError;

/// A simple message body, shared by success and error responses.
#[derive(Debug, Serialize)]
pub struct Message {
    pub detail: String,
}

pub struct AppState {
    pub users: Arc<dyn UserService>,

    pub tokens: TokenCodec,
}

/// Connect the store, bootstrap the admin user, and assemble shared state.
pub async fn create_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::new(&config.pg_dsn).await?;
    store.ensure_admin(&config.admin_password).await?;

    let users: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(store));
    let tokens = TokenCodec::new(&config.jwt_key);

    Ok(Arc::new(AppState { users, tokens }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(auth::login))
        .route("/validate", post(auth::validate_token))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
