use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::store::CredentialStore;
use super::token::{self, Claims};
use crate::error::{AppError, Result};
use crate::utils::{mask_key, token_hex};

pub const FALLBACK_SECRET: &str = "default-12345-secret-key";

pub const API_KEY_PREFIX: &str = "mock_";
pub const ACCESS_TOKEN_PREFIX: &str = "oauth_";
pub const REFRESH_TOKEN_PREFIX: &str = "refresh_";
pub const DEFAULT_ADMIN_PREFIX: &str = "admin";

const KEY_BYTES: usize = 16;
const OAUTH_TOKEN_BYTES: usize = 20;
const OAUTH_EXPIRES_IN_SECS: u64 = 3600;
const OAUTH_SCOPE: &str = "read write";

/// Late-bound signing secret, filled in once configuration has loaded.
#[derive(Clone, Default)]
pub struct SigningSecret(Arc<RwLock<Option<String>>>);

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.0.read().is_some() { "set" } else { "unset" };
        f.debug_tuple("SigningSecret").field(&state).finish()
    }
}

impl SigningSecret {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, secret: impl Into<String>) {
        *self.0.write() = Some(secret.into());
    }

    pub fn clear(&self) {
        *self.0.write() = None;
    }

    /// Current secret, or the fallback literal when unset or empty.
    pub fn resolve(&self) -> String {
        match self.0.read().as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => FALLBACK_SECRET.to_string(),
        }
    }
}

/// OAuth2-style token response. Only the access token is verifiable.
#[derive(Debug, Clone, Serialize)]
pub struct OAuthTokenPair {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub refresh_token: String,
    pub scope: &'static str,
}

/// Issuance and verification facade over the credential store and token codec.
pub struct AuthManager {
    store: Arc<CredentialStore>,
    secret: SigningSecret,
}

impl AuthManager {
    pub fn new(store: Arc<CredentialStore>, secret: SigningSecret) -> Self {
        Self { store, secret }
    }

    pub fn secret(&self) -> String {
        self.secret.resolve()
    }

    pub fn issue_jwt(&self, claims: Claims) -> Result<String> {
        let token = token::encode_claims(claims, &self.secret())
            .map_err(|e| AppError::Internal(e.into()))?;
        tracing::info!("JWT issued");
        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> Option<Claims> {
        match token::decode_claims(token, &self.secret()) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "JWT verification failed");
                None
            }
        }
    }

    pub fn issue_api_key(&self) -> String {
        let key = format!("{API_KEY_PREFIX}{}", token_hex(KEY_BYTES));
        self.store.add_ephemeral(key.clone());
        tracing::info!(key = %mask_key(&key), "API key issued");
        key
    }

    pub fn issue_oauth_pair(&self) -> OAuthTokenPair {
        let pair = OAuthTokenPair {
            access_token: format!("{ACCESS_TOKEN_PREFIX}{}", token_hex(OAUTH_TOKEN_BYTES)),
            token_type: "bearer",
            expires_in: OAUTH_EXPIRES_IN_SECS,
            refresh_token: format!("{REFRESH_TOKEN_PREFIX}{}", token_hex(OAUTH_TOKEN_BYTES)),
            scope: OAUTH_SCOPE,
        };
        // The refresh token is handed out but never registered.
        self.store.add_ephemeral(pair.access_token.clone());
        tracing::info!(access_token = %mask_key(&pair.access_token), "OAuth token pair issued");
        pair
    }

    pub fn verify_api_key(&self, candidate: &str) -> bool {
        self.store.verify(candidate)
    }

    /// Register an admin key, choosing its value as follows: the requested key if
    /// given (else `admin_<hex>`), replaced by `<prefix>_<hex>` when a non-empty
    /// `prefix` is given and the key does not start with it.
    pub fn create_admin_key(&self, requested: Option<String>, prefix: Option<&str>) -> String {
        let mut key = requested
            .unwrap_or_else(|| format!("{DEFAULT_ADMIN_PREFIX}_{}", token_hex(KEY_BYTES)));

        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            if !key.starts_with(prefix) {
                tracing::debug!(prefix, "Requested admin key lacks prefix, generating a new one");
                key = format!("{prefix}_{}", token_hex(KEY_BYTES));
            }
        }

        self.store.add_admin(key.clone());
        key
    }

    pub fn add_admin_key(&self, key: impl Into<String>) {
        self.store.add_admin(key);
    }

    pub fn remove_admin_key(&self, key: &str) {
        self.store.remove_admin(key);
    }

    pub fn admin_keys(&self) -> Vec<String> {
        self.store.list_admin()
    }

    pub fn generated_tokens(&self) -> Vec<String> {
        self.store.list_ephemeral()
    }

    pub fn clear_generated_tokens(&self) -> usize {
        let count = self.store.clear_ephemeral();
        tracing::info!(count, "Cleared generated tokens");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> AuthManager {
        AuthManager::new(Arc::new(CredentialStore::new()), SigningSecret::new())
    }

    fn claims(value: serde_json::Value) -> Claims {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_jwt_round_trip() {
        let manager = manager();
        let token = manager
            .issue_jwt(claims(json!({ "user_id": "u1", "role": "admin" })))
            .unwrap();

        let decoded = manager.verify_jwt(&token).unwrap();
        assert_eq!(decoded["user_id"], "u1");
        assert_eq!(decoded["role"], "admin");
        assert!(decoded.contains_key("iat"));
        assert!(decoded.contains_key("exp"));
    }

    #[test]
    fn test_secret_is_resolved_per_call() {
        let secret = SigningSecret::new();
        let manager = AuthManager::new(Arc::new(CredentialStore::new()), secret.clone());
        assert_eq!(manager.secret(), FALLBACK_SECRET);

        let token = manager.issue_jwt(Claims::new()).unwrap();

        secret.set("rotated-after-construction");
        assert_eq!(manager.secret(), "rotated-after-construction");
        assert!(manager.verify_jwt(&token).is_none());

        secret.clear();
        assert!(manager.verify_jwt(&token).is_some());
    }

    #[test]
    fn test_empty_secret_falls_back() {
        let secret = SigningSecret::new();
        secret.set("");
        assert_eq!(secret.resolve(), FALLBACK_SECRET);
    }

    #[test]
    fn test_api_key_valid_until_cleared() {
        let manager = manager();
        let key = manager.issue_api_key();

        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 32);
        assert!(manager.verify_api_key(&key));

        assert_eq!(manager.clear_generated_tokens(), 1);
        assert!(!manager.verify_api_key(&key));
    }

    #[test]
    fn test_oauth_pair_registers_only_access_token() {
        let manager = manager();
        let pair = manager.issue_oauth_pair();

        assert!(pair.access_token.starts_with(ACCESS_TOKEN_PREFIX));
        assert!(pair.refresh_token.starts_with(REFRESH_TOKEN_PREFIX));
        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 3600);
        assert!(manager.verify_api_key(&pair.access_token));
        assert!(!manager.verify_api_key(&pair.refresh_token));
    }

    #[test]
    fn test_admin_key_lifecycle() {
        let manager = manager();
        manager.add_admin_key("admin_fixed");
        assert!(manager.verify_api_key("admin_fixed"));

        manager.remove_admin_key("admin_fixed");
        assert!(!manager.verify_api_key("admin_fixed"));

        manager.remove_admin_key("admin_fixed");
        assert!(manager.admin_keys().is_empty());
    }

    #[test]
    fn test_create_admin_key_defaults() {
        let manager = manager();
        let key = manager.create_admin_key(None, Some(DEFAULT_ADMIN_PREFIX));
        assert!(key.starts_with("admin_"));
        assert_eq!(manager.admin_keys(), vec![key]);
    }

    #[test]
    fn test_create_admin_key_keeps_matching_request() {
        let manager = manager();
        let key = manager.create_admin_key(Some("admin_custom".into()), Some("admin"));
        assert_eq!(key, "admin_custom");
    }

    #[test]
    fn test_create_admin_key_discards_mismatched_request() {
        let manager = manager();
        let key = manager.create_admin_key(Some("custom".into()), Some("team"));

        assert!(key.starts_with("team_"));
        assert_ne!(key, "custom");
        assert!(!manager.verify_api_key("custom"));
        assert!(manager.verify_api_key(&key));
    }

    #[test]
    fn test_create_admin_key_without_prefix_constraint() {
        let manager = manager();
        assert_eq!(manager.create_admin_key(Some("anything".into()), None), "anything");
        assert_eq!(manager.create_admin_key(Some("other".into()), Some("")), "other");
    }
}
