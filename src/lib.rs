//! Authentication gateway for the mock HTTP service.
//!
//! Issues JWTs, opaque API keys and OAuth-style token pairs, and gates routes
//! on the credential schemes they declare (`jwt`, `api_key`, `basic`,
//! `bearer`, `any`). Admin keys are kept in memory and flushed back to the
//! config file after each change.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod utils;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthManager, CredentialStore, SigningSecret, TomlKeyFile};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
}

impl AppState {
    pub fn new(auth: AuthManager) -> Self {
        Self { auth: Arc::new(auth) }
    }

    /// Seed admin keys from `config`, persist changes back to its source file,
    /// and bind the signing secret.
    pub fn from_config(config: &Config) -> Self {
        let mut store = CredentialStore::new().with_admin_keys(config.admin.keys());
        if let Some(path) = &config.source {
            store = store.with_persistence(Arc::new(TomlKeyFile::new(path)));
        }

        let secret = SigningSecret::new();
        match &config.jwt.secret {
            Some(value) => secret.set(value.clone()),
            None => tracing::warn!("No jwt.secret configured, using fallback signing secret"),
        }

        Self::new(AuthManager::new(Arc::new(store), secret))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::routes(&state))
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
