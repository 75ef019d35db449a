use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::gated;
use crate::auth::DEFAULT_ADMIN_PREFIX;
use crate::error::{AppError, Result};
use crate::middleware::AuthScheme;
use crate::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/api-keys",
            gated(state, AuthScheme::Any, get(list_admin_keys).post(create_admin_key)),
        )
        .route("/admin/api-keys/:api_key", gated(state, AuthScheme::Any, delete(delete_admin_key)))
        .route("/admin/generated-tokens", gated(state, AuthScheme::Any, get(list_generated_tokens)))
        .route("/admin/clear-tokens", gated(state, AuthScheme::Any, post(clear_generated_tokens)))
}

#[derive(Debug, Serialize)]
pub struct AdminKeysResponse {
    pub admin_api_keys: Vec<String>,
    pub total: usize,
}

async fn list_admin_keys(State(state): State<AppState>) -> Json<AdminKeysResponse> {
    let keys = state.auth.admin_keys();
    Json(AdminKeysResponse {
        total: keys.len(),
        admin_api_keys: keys,
    })
}

fn default_prefix() -> Option<String> {
    Some(DEFAULT_ADMIN_PREFIX.to_string())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminKeyRequest {
    #[validate(length(max = 256))]
    pub api_key: Option<String>,
    /// Omitted means `admin`; explicit `null` or `""` disables the check.
    #[serde(default = "default_prefix")]
    #[validate(length(max = 256))]
    pub prefix: Option<String>,
}

impl Default for CreateAdminKeyRequest {
    fn default() -> Self {
        Self {
            api_key: None,
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateAdminKeyResponse {
    pub message: &'static str,
    pub api_key: String,
    pub usage: &'static str,
}

/// Parse the create body; empty or `null` means all defaults.
fn parse_create_request(body: &[u8]) -> Result<CreateAdminKeyRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateAdminKeyRequest::default());
    }

    let request: Option<CreateAdminKeyRequest> = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("malformed request body: {e}")))?;
    let request = request.unwrap_or_default();
    request.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(request)
}

async fn create_admin_key(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateAdminKeyResponse>> {
    let payload = parse_create_request(&body)?;

    // The admin set is flushed to the config file synchronously.
    let auth = state.auth.clone();
    let api_key = tokio::task::spawn_blocking(move || {
        auth.create_admin_key(payload.api_key, payload.prefix.as_deref())
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(CreateAdminKeyResponse {
        message: "Admin API key created successfully",
        api_key,
        usage: "Use in Authorization header as: ApiKey <key>",
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteAdminKeyResponse {
    pub message: &'static str,
    pub deleted_key: String,
}

/// Reports success whether or not the key existed.
async fn delete_admin_key(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
) -> Result<Json<DeleteAdminKeyResponse>> {
    let auth = state.auth.clone();
    let api_key = tokio::task::spawn_blocking(move || {
        auth.remove_admin_key(&api_key);
        api_key
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(DeleteAdminKeyResponse {
        message: "Admin API key deleted successfully",
        deleted_key: api_key,
    }))
}

#[derive(Debug, Serialize)]
pub struct GeneratedTokensResponse {
    pub generated_tokens: Vec<String>,
    pub total: usize,
}

async fn list_generated_tokens(State(state): State<AppState>) -> Json<GeneratedTokensResponse> {
    let tokens = state.auth.generated_tokens();
    Json(GeneratedTokensResponse {
        total: tokens.len(),
        generated_tokens: tokens,
    })
}

#[derive(Debug, Serialize)]
pub struct ClearTokensResponse {
    pub message: String,
    pub cleared_count: usize,
}

async fn clear_generated_tokens(State(state): State<AppState>) -> Json<ClearTokensResponse> {
    let count = state.auth.clear_generated_tokens();
    Json(ClearTokensResponse {
        message: format!("Cleared {count} generated tokens"),
        cleared_count: count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_prefix_defaults_to_admin() {
        let request: CreateAdminKeyRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.prefix.as_deref(), Some("admin"));
        assert!(request.api_key.is_none());
    }

    #[test]
    fn test_request_null_prefix_disables_check() {
        let request: CreateAdminKeyRequest =
            serde_json::from_str(r#"{"api_key":"k","prefix":null}"#).unwrap();
        assert!(request.prefix.is_none());
        assert_eq!(request.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_parse_create_request_defaults_on_blank_or_null() {
        for body in [&b""[..], b"  \n", b"null"] {
            let request = parse_create_request(body).unwrap();
            assert!(request.api_key.is_none());
            assert_eq!(request.prefix.as_deref(), Some("admin"));
        }
    }

    #[test]
    fn test_parse_create_request_rejects_bad_bodies() {
        let oversized = format!(r#"{{"api_key":"{}"}}"#, "x".repeat(300));
        for body in [
            r#"{"api_key": 5}"#,
            r#"{"prefix": 7}"#,
            "{oops",
            "[1, 2]",
            oversized.as_str(),
        ] {
            assert!(
                matches!(parse_create_request(body.as_bytes()), Err(AppError::BadRequest(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_request_rejects_oversized_key() {
        let request = CreateAdminKeyRequest {
            api_key: Some("x".repeat(300)),
            prefix: None,
        };
        assert!(request.validate().is_err());
    }
}
