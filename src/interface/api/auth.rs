//! Bearer token authentication
//!
//! Every tenant-scoped route extracts an [`OrgContext`]; handlers never
//! read the organization id from the request body.

use crate::domain::shared::DomainError;
use crate::interface::api::dto::ApiError;
use crate::interface::api::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Caller identity resolved from a bearer token
#[derive(Debug, Clone, Copy)]
pub struct OrgContext {
    pub organization_id: Uuid,
    pub user_id: Uuid,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_bearer(&self, token: &str) -> crate::domain::shared::Result<OrgContext>;
}

/// Token table verifier, loaded from configuration
pub struct StaticTokenVerifier {
    tokens: RwLock<HashMap<String, OrgContext>>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, token: String, organization_id: Uuid, user_id: Uuid) {
        let mut tokens = self.tokens.write().await;
        tokens.insert(
            token,
            OrgContext {
                organization_id,
                user_id,
            },
        );
    }
}

impl Default for StaticTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify_bearer(&self, token: &str) -> crate::domain::shared::Result<OrgContext> {
        let tokens = self.tokens.read().await;
        tokens
            .get(token)
            .copied()
            .ok_or_else(|| DomainError::Unauthorized("invalid bearer token".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OrgContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError(DomainError::Unauthorized(
                    "missing authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError(DomainError::Unauthorized(
                "authorization header must be a bearer token".to_string(),
            ))
        })?;

        let context = state.identity.verify_bearer(token).await?;
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier_lookup() {
        let verifier = StaticTokenVerifier::new();
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        verifier.insert("tok-1".to_string(), org, user).await;

        let ctx = verifier.verify_bearer("tok-1").await.unwrap();
        assert_eq!(ctx.organization_id, org);
        assert_eq!(ctx.user_id, user);

        let err = verifier.verify_bearer("tok-2").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }
}
