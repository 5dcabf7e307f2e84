//! Authentication context extraction
//!
//! Handlers that take an [`AuthContext`] argument only run for requests
//! carrying a valid session token, read from the `Authorization: Bearer`
//! header or, failing that, the `token` cookie. The token is resolved to the
//! current user document, so a disabled or deleted account is rejected even
//! while its token has not expired.

use auth_identity::{is_role_allowed, Role, User};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::CareHubServer;

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role()
    }

    /// Deny unless the caller's role is in `allowed`
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if is_role_allowed(Some(self.role()), allowed) {
            Ok(())
        } else {
            Err(ApiError::forbidden_role())
        }
    }
}

/// Bearer header first, then the session cookie
fn extract_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<CareHubServer> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &CareHubServer,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| ApiError::authentication("Authentication required"))?;
        let user = server.identity.verify_token(&token).await?;
        Ok(Self { user })
    }
}
