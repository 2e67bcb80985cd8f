//! Authentication and authorization utilities
//!
//! Provides:
//! - API key validation
//! - JWT token generation and validation
//! - Workspace context extraction

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Workspace (tenant) ID
    pub workspace_id: Uuid,

    /// API key (if authenticated via API key)
    pub api_key: Option<String>,

    /// User ID of the acting owner (if authenticated via JWT)
    pub user_id: Option<Uuid>,

    /// Scopes/permissions
    pub scopes: Vec<String>,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// Check if the context has a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(&scope.to_string()) || self.scopes.contains(&"admin".to_string())
    }

    /// Require a specific scope, returning error if not present
    pub fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required scope: {}", scope),
            })
        }
    }

    /// The owner id recorded on documents and signing links.
    /// Falls back to the workspace id for API-key-only callers.
    pub fn owner_id(&self) -> Uuid {
        self.user_id.unwrap_or(self.workspace_id)
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Workspace ID
    pub workspace_id: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        scopes: Vec<String>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            scopes,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e),
            })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::ExpiredToken
                    }
                    _ => AppError::InvalidApiKey,
                }
            })
    }
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate an API key against a stored hash
pub fn validate_api_key(api_key: &str, stored_hash: &str) -> bool {
    hash_api_key(api_key) == stored_hash
}

/// Generate a new workspace API key
pub fn generate_api_key() -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("wk_{}", hex::encode(random_bytes))
}

/// Extract API key from Authorization header
pub fn extract_api_key(auth_header: &str) -> Option<&str> {
    if auth_header.starts_with("Bearer ") {
        Some(&auth_header[7..])
    } else {
        None
    }
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Extract workspace ID
        let workspace_id = parts
            .headers
            .get("x-workspace-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing or invalid X-Workspace-ID header".to_string(),
            })?;

        // Extract API key or JWT
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let api_key = extract_api_key(auth_header)
            .map(String::from);

        // Keys carry the wk_ prefix; anything else is rejected before the
        // database lookup in the handler layer.
        if let Some(ref key) = api_key {
            if !key.starts_with("wk_") {
                return Err(AppError::InvalidApiKey);
            }
        }

        Ok(AuthContext {
            workspace_id,
            api_key,
            user_id: None,
            scopes: vec!["read".to_string(), "write".to_string()],
            request_id,
        })
    }
}

/// Middleware for API key authentication
pub async fn auth_middleware(
    request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    // Check for Authorization header
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    if auth_header.is_none() {
        return Err(AppError::Unauthorized {
            message: "Missing Authorization header".to_string(),
        });
    }

    // Check for Workspace ID header
    let workspace_header = request
        .headers()
        .get("x-workspace-id")
        .and_then(|v| v.to_str().ok());

    if workspace_header.is_none() {
        return Err(AppError::Unauthorized {
            message: "Missing X-Workspace-ID header".to_string(),
        });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_api_key() {
        let key = "wk_test_12345";
        let hash = hash_api_key(key);
        assert!(validate_api_key(key, &hash));
        assert!(!validate_api_key("wrong_key", &hash));
    }

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key();
        assert!(key.starts_with("wk_"));
        assert!(key.len() > 10);
    }

    #[test]
    fn test_extract_api_key() {
        assert_eq!(extract_api_key("Bearer wk_123"), Some("wk_123"));
        assert_eq!(extract_api_key("wk_123"), None);
        assert_eq!(extract_api_key("Basic abc"), None);
    }

    #[test]
    fn test_owner_id_fallback() {
        let workspace_id = Uuid::new_v4();
        let ctx = AuthContext {
            workspace_id,
            api_key: Some("wk_abc".into()),
            user_id: None,
            scopes: vec![],
            request_id: "r".into(),
        };
        assert_eq!(ctx.owner_id(), workspace_id);

        let user_id = Uuid::new_v4();
        let ctx = AuthContext { user_id: Some(user_id), ..ctx };
        assert_eq!(ctx.owner_id(), user_id);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let scopes = vec!["read".to_string(), "write".to_string()];

        let token = manager.generate_token(user_id, workspace_id, scopes.clone()).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.workspace_id, workspace_id.to_string());
        assert_eq!(claims.scopes, scopes);
    }
}
