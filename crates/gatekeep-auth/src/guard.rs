// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request authentication and permission requirements.
//!
//! [`Authenticator`] turns an `Authorization` header into a
//! [`RequestContext`]; [`PermissionGuard`] checks permissions against it.
//! Both are transport agnostic: an HTTP layer passes the raw header value in
//! and maps [`AuthError`] back out.

use uuid::Uuid;

use gatekeep_core::{AuthError, AuthResult};

use crate::config::ActivityConfig;
use crate::permission::{PermissionCache, PermissionResolver};
use crate::session::{ActivityTracker, SessionManager};
use crate::token::BEARER;

// =============================================================================
// Bearer parsing
// =============================================================================

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for a missing
/// scheme, another scheme, or an empty token.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

// =============================================================================
// RequestContext
// =============================================================================

/// Identity and per-request state attached to an authenticated request.
///
/// Owns the request's [`PermissionCache`]; dropping the context ends the
/// cache's lifetime.
#[derive(Debug)]
pub struct RequestContext {
    /// Authenticated user ID.
    pub user_id: String,
    /// Session the access token is bound to.
    pub session_id: String,
    /// Access token ID (`jti`).
    pub token_id: String,
    /// Request ID for tracing.
    pub request_id: Uuid,
    permissions: PermissionCache,
}

impl RequestContext {
    /// Creates a context with a fresh permission cache.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        token_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            token_id: token_id.into(),
            request_id: Uuid::now_v7(),
            permissions: PermissionCache::new(),
        }
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request-scoped permission cache.
    pub fn cache(&self) -> &PermissionCache {
        &self.permissions
    }
}

// =============================================================================
// Authenticator
// =============================================================================

/// Validates bearer credentials against tokens and live sessions.
pub struct Authenticator {
    sessions: SessionManager,
    tracker: ActivityTracker,
}

impl Authenticator {
    /// Creates an authenticator and spawns its activity worker.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(sessions: SessionManager, config: &ActivityConfig) -> Self {
        let tracker = ActivityTracker::spawn(sessions.clone(), config);
        Self { sessions, tracker }
    }

    /// Authenticates a request from its `Authorization` header value.
    ///
    /// Malformed credentials are rejected before any repository access.
    /// Token errors are returned unchanged, so an expired token reports
    /// [`AuthError::ExpiredToken`]. A missing or revoked session reports
    /// [`AuthError::SessionRevoked`].
    pub async fn authenticate(&self, authorization: Option<&str>) -> AuthResult<RequestContext> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingCredentials)?;

        let claims = self.sessions.tokens().validate_access_token(token)?;

        match self.sessions.get_session_by_id(&claims.session_id).await {
            Ok(Some(session)) if session.is_active() && session.user_id == claims.user_id => {}
            Ok(_) => {
                tracing::debug!(session_id = %claims.session_id, "Session inactive or missing");
                return Err(AuthError::SessionRevoked);
            }
            Err(e) => {
                tracing::warn!(session_id = %claims.session_id, error = %e, "Session lookup failed");
                return Err(AuthError::SessionRevoked);
            }
        }

        self.tracker.record(&claims.session_id);

        Ok(RequestContext::new(claims.user_id, claims.session_id, claims.jti))
    }

    /// Returns the activity tracker.
    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    /// Drains pending activity updates and stops the worker.
    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PermissionGuard
// =============================================================================

/// Enforces permission requirements for an authenticated request.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    resolver: PermissionResolver,
}

impl PermissionGuard {
    /// Creates a guard over the given resolver.
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    /// Requires a single permission.
    pub async fn require(&self, ctx: &RequestContext, code: &str) -> AuthResult<()> {
        if self
            .resolver
            .has_permission(ctx.cache(), &ctx.user_id, code)
            .await?
        {
            return Ok(());
        }
        Self::deny(ctx, code)
    }

    /// Requires at least one of the permissions.
    pub async fn require_any(&self, ctx: &RequestContext, codes: &[&str]) -> AuthResult<()> {
        if self
            .resolver
            .has_any_permission(ctx.cache(), &ctx.user_id, codes)
            .await?
        {
            return Ok(());
        }
        Self::deny(ctx, &codes.join("|"))
    }

    /// Requires every one of the permissions.
    pub async fn require_all(&self, ctx: &RequestContext, codes: &[&str]) -> AuthResult<()> {
        if self
            .resolver
            .has_all_permissions(ctx.cache(), &ctx.user_id, codes)
            .await?
        {
            return Ok(());
        }
        Self::deny(ctx, &codes.join(","))
    }

    fn deny(ctx: &RequestContext, code: &str) -> AuthResult<()> {
        tracing::debug!(
            user_id = %ctx.user_id,
            request_id = %ctx.request_id,
            permission = %code,
            "Permission denied"
        );
        Err(AuthError::permission_denied(code))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("BEARER abc"), Some("abc"));
        assert_eq!(extract_bearer_token("  Bearer   abc  "), Some("abc"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_malformed() {
        assert_eq!(extract_bearer_token(""), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer a b"), None);
        assert_eq!(extract_bearer_token("abc.def.ghi"), None);
    }

    #[test]
    fn test_request_context_has_fresh_cache() {
        let a = RequestContext::new("u", "s", "j");
        let b = RequestContext::new("u", "s", "j");
        assert!(a.cache().is_empty());
        assert_ne!(a.request_id, b.request_id);
    }
}
