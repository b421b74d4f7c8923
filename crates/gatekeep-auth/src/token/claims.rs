// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminates access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token presented on every request.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
}

impl TokenType {
    /// Returns the wire name of the token type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Claims carried by both token types.
///
/// A payload that cannot be decoded into this struct (missing `uid`, `sid`,
/// unknown `typ`, ...) is rejected as invalid claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Registered Claims (RFC 7519)
    // =========================================================================
    /// Subject, equal to the user ID.
    pub sub: String,

    /// Unique token ID.
    pub jti: String,

    /// Issuer.
    pub iss: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Not before (Unix timestamp), equal to `iat`.
    pub nbf: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    // =========================================================================
    // Private Claims
    // =========================================================================
    /// User ID.
    #[serde(rename = "uid")]
    pub user_id: String,

    /// Session the token is bound to.
    #[serde(rename = "sid")]
    pub session_id: String,

    /// Access or refresh.
    #[serde(rename = "typ")]
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims issued now and expiring after `ttl_secs`.
    ///
    /// A negative `ttl_secs` yields claims that are already expired; `exp`
    /// saturates instead of overflowing.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        token_type: TokenType,
        issuer: impl Into<String>,
        ttl_secs: i64,
    ) -> Self {
        let now = Utc::now().timestamp();
        let user_id = user_id.into();

        Self {
            sub: user_id.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: issuer.into(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl_secs),
            user_id,
            session_id: session_id.into(),
            token_type,
        }
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================
