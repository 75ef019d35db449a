use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::gated;
use crate::auth::{Claims, OAuthTokenPair};
use crate::error::{AppError, Result};
use crate::middleware::{AuthScheme, Identity};
use crate::AppState;

const JWT_EXPIRES_IN_SECS: u64 = 86_400;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/api-key", get(issue_api_key))
        .route("/auth/jwt-token", post(issue_jwt_token))
        .route("/auth/oauth-token", post(issue_oauth_token))
        .route("/auth/verify", gated(state, AuthScheme::Any, get(verify)))
        .route("/auth/protected", gated(state, AuthScheme::Any, get(protected)))
        .route("/auth/jwt-only", gated(state, AuthScheme::Jwt, get(jwt_only)))
        .route("/auth/api-key-only", gated(state, AuthScheme::ApiKey, get(api_key_only)))
        .route("/auth/basic-only", gated(state, AuthScheme::Basic, get(basic_only)))
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
    pub message: &'static str,
}

async fn issue_api_key(State(state): State<AppState>) -> Json<ApiKeyResponse> {
    Json(ApiKeyResponse {
        api_key: state.auth.issue_api_key(),
        message: "Use this API key in Authorization header as: ApiKey <key>",
    })
}

#[derive(Debug, Serialize)]
pub struct JwtTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

fn default_claims() -> Claims {
    let mut claims = Map::new();
    claims.insert("user_id".into(), json!("mock_user_123"));
    claims.insert("username".into(), json!("mock_user"));
    claims.insert("role".into(), json!("admin"));
    claims
}

/// Parse the optional override body; empty means no overrides.
fn parse_overrides(body: &[u8]) -> Result<Claims> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Claims::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(Value::Null) => Ok(Claims::new()),
        Ok(_) => Err(AppError::BadRequest("claims must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("malformed JSON body: {e}"))),
    }
}

async fn issue_jwt_token(State(state): State<AppState>, body: Bytes) -> Result<Json<JwtTokenResponse>> {
    let mut claims = default_claims();
    claims.extend(parse_overrides(&body)?);

    Ok(Json(JwtTokenResponse {
        access_token: state.auth.issue_jwt(claims)?,
        token_type: "bearer",
        expires_in: JWT_EXPIRES_IN_SECS,
    }))
}

async fn issue_oauth_token(State(state): State<AppState>) -> Json<OAuthTokenPair> {
    Json(state.auth.issue_oauth_pair())
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub auth_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

async fn verify(identity: Option<Extension<Identity>>) -> Response {
    match identity {
        Some(Extension(identity)) => Json(VerifyResponse {
            valid: true,
            auth_type: identity.auth_type(),
            user: identity.user(),
        })
        .into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "valid": false }))).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: &'static str,
    pub auth_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

async fn protected(identity: Option<Extension<Identity>>) -> Json<ProtectedResponse> {
    let identity = identity.map(|Extension(identity)| identity);

    Json(ProtectedResponse {
        message: "Access granted to protected route",
        auth_type: identity.as_ref().map_or("unknown", Identity::auth_type),
        user: identity.as_ref().and_then(Identity::user),
    })
}

#[derive(Debug, Serialize)]
pub struct SchemeOnlyResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

async fn jwt_only(identity: Option<Extension<Identity>>) -> Json<SchemeOnlyResponse> {
    Json(SchemeOnlyResponse {
        message: "JWT authentication successful",
        user: identity.and_then(|Extension(identity)| identity.user()),
    })
}

async fn api_key_only() -> Json<SchemeOnlyResponse> {
    Json(SchemeOnlyResponse {
        message: "API Key authentication successful",
        user: None,
    })
}

async fn basic_only(identity: Option<Extension<Identity>>) -> Json<SchemeOnlyResponse> {
    Json(SchemeOnlyResponse {
        message: "Basic authentication successful",
        user: identity.and_then(|Extension(identity)| identity.user()),
    })
}
