mod admin;
mod auth;

use axum::{middleware::from_fn_with_state, routing::MethodRouter, Router};

use crate::middleware::{require_auth, AuthScheme, RequireAuth};
use crate::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes(state))
        .merge(admin::routes(state))
}

/// Wrap `route` so it only runs once a credential accepted by `scheme` verifies.
fn gated(state: &AppState, scheme: AuthScheme, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(
        RequireAuth::new(state.auth.clone(), scheme),
        require_auth,
    ))
}
