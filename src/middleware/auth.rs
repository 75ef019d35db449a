use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

use crate::auth::{AuthManager, Claims};
use crate::error::{AppError, Result};

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";
const BASIC_PREFIX: &str = "Basic ";

/// Credential schemes a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Jwt,
    ApiKey,
    Basic,
    Bearer,
    Any,
}

impl AuthScheme {
    /// `Bearer` routes also try JWT decoding first.
    fn tries_jwt(self) -> bool {
        matches!(self, AuthScheme::Jwt | AuthScheme::Bearer | AuthScheme::Any)
    }

    fn tries_api_key(self) -> bool {
        matches!(self, AuthScheme::ApiKey | AuthScheme::Any)
    }

    fn tries_basic(self) -> bool {
        matches!(self, AuthScheme::Basic | AuthScheme::Any)
    }

    fn tries_opaque_bearer(self) -> bool {
        matches!(self, AuthScheme::Bearer | AuthScheme::Any)
    }
}

/// Who authenticated the request, inserted into request extensions.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Jwt(Claims),
    ApiKey,
    Basic { username: String },
    Bearer,
}

impl Identity {
    pub fn auth_type(&self) -> &'static str {
        match self {
            Identity::Jwt(_) => "jwt",
            Identity::ApiKey => "api_key",
            Identity::Basic { .. } => "basic",
            Identity::Bearer => "bearer",
        }
    }

    /// Scheme payload as rendered to clients; `None` for api_key and bearer.
    pub fn user(&self) -> Option<Value> {
        match self {
            Identity::Jwt(claims) => Some(Value::Object(claims.clone())),
            Identity::Basic { username } => Some(json!({
                "username": username,
                "auth_type": "basic",
            })),
            Identity::ApiKey | Identity::Bearer => None,
        }
    }
}

/// Decide whether a request may proceed under `scheme`.
///
/// Branches are tried in a fixed order (JWT, API key, Basic, opaque bearer);
/// the first that verifies wins. `Ok(None)` means a pre-flight request that
/// was let through without credentials.
pub fn resolve(
    auth: &AuthManager,
    scheme: AuthScheme,
    method: &Method,
    header: Option<&str>,
) -> Result<Option<Identity>> {
    if *method == Method::OPTIONS {
        return Ok(None);
    }

    let header = header.ok_or(AppError::MissingCredential)?;

    if scheme.tries_jwt() {
        if let Some(token) = header.strip_prefix(BEARER_PREFIX) {
            if let Some(claims) = auth.verify_jwt(token) {
                return Ok(Some(Identity::Jwt(claims)));
            }
        }
    }

    if scheme.tries_api_key() {
        if let Some(key) = header.strip_prefix(API_KEY_PREFIX) {
            if auth.verify_api_key(key) {
                return Ok(Some(Identity::ApiKey));
            }
        }
    }

    if scheme.tries_basic() {
        if let Some(encoded) = header.strip_prefix(BASIC_PREFIX) {
            if let Some(username) = decode_basic(encoded) {
                return Ok(Some(Identity::Basic { username }));
            }
        }
    }

    if scheme.tries_opaque_bearer() {
        if let Some(token) = header.strip_prefix(BEARER_PREFIX) {
            if auth.verify_api_key(token) {
                return Ok(Some(Identity::Bearer));
            }
        }
    }

    tracing::debug!(?scheme, "No credential branch verified");
    Err(AppError::InvalidCredential)
}

/// Any well-formed `user:pass` pair is accepted; only the username is kept.
fn decode_basic(encoded: &str) -> Option<String> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, _password) = credentials.split_once(':')?;
    Some(username.to_string())
}

/// Middleware state: the manager plus the scheme the wrapped routes accept.
#[derive(Clone)]
pub struct RequireAuth {
    auth: Arc<AuthManager>,
    scheme: AuthScheme,
}

impl RequireAuth {
    pub fn new(auth: Arc<AuthManager>, scheme: AuthScheme) -> Self {
        Self { auth, scheme }
    }
}

pub async fn require_auth(
    State(guard): State<RequireAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let identity = {
        // A header that is not visible ASCII can never match a scheme prefix.
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .map(|h| h.to_str().unwrap_or_default());

        resolve(&guard.auth, guard.scheme, request.method(), header)?
    };

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}
