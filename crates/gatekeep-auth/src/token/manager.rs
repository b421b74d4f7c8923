// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token pair issuance and validation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use gatekeep_core::{AuthError, AuthResult};

use super::claims::{Claims, TokenType};
use crate::config::TokenConfig;

/// Token type literal returned to clients.
pub const BEARER: &str = "Bearer";

const ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// TokenPair
// =============================================================================

/// An access token and a refresh token bound to the same session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Always `Bearer`.
    pub token_type: String,
}

/// Returns the hex SHA-256 digest of a raw token.
///
/// Sessions store only this digest, never the token itself.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

// =============================================================================
// TokenManager
// =============================================================================

/// Issues and validates HS256 token pairs.
///
/// Stateless apart from the signing key and the configured lifetimes; cheap
/// to clone and safe to share across tasks.
#[derive(Clone)]
pub struct TokenManager {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenManager {
    /// Creates a token manager from a validated configuration.
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = config.leeway_secs;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Issues an access/refresh pair for a session.
    pub fn generate_token_pair(&self, user_id: &str, session_id: &str) -> AuthResult<TokenPair> {
        let access = self.claims(user_id, session_id, TokenType::Access);
        let refresh = self.claims(user_id, session_id, TokenType::Refresh);

        let expires_at = access
            .expires_at()
            .ok_or_else(|| AuthError::token_signing("access expiry out of range"))?;
        let refresh_expires_at = refresh
            .expires_at()
            .ok_or_else(|| AuthError::token_signing("refresh expiry out of range"))?;

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            expires_at,
            refresh_expires_at,
            token_type: BEARER.to_string(),
        })
    }

    /// Signs arbitrary claims with the configured key.
    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AuthError::token_signing(e.to_string()))
    }

    /// Validates an access token and returns its claims.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        self.validate(token, TokenType::Access)
    }

    /// Validates a refresh token and returns its claims.
    pub fn validate_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        self.validate(token, TokenType::Refresh)
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        i64::try_from(self.config.access_ttl.as_secs()).unwrap_or(i64::MAX)
    }

    /// Returns the refresh token lifetime in seconds.
    pub fn refresh_ttl_secs(&self) -> i64 {
        i64::try_from(self.config.refresh_ttl.as_secs()).unwrap_or(i64::MAX)
    }

    /// Returns the refresh token lifetime, which also bounds a session's age.
    pub fn refresh_ttl(&self) -> std::time::Duration {
        self.config.refresh_ttl
    }

    /// Returns the configured issuer.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    fn claims(&self, user_id: &str, session_id: &str, token_type: TokenType) -> Claims {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_secs(),
            TokenType::Refresh => self.refresh_ttl_secs(),
        };
        Claims::new(user_id, session_id, token_type, &self.config.issuer, ttl)
    }

    fn validate(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
        // Signature and registered claims first, then the private claim shape.
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
                _ => {
                    tracing::debug!(error = %e, "Token rejected");
                    AuthError::InvalidToken
                }
            })?;

        let claims: Claims =
            serde_json::from_value(data.claims).map_err(|_| AuthError::InvalidClaims)?;

        if claims.token_type != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.token_type,
                "Token type mismatch"
            );
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("issuer", &self.config.issuer)
            .field("access_ttl", &self.config.access_ttl)
            .field("refresh_ttl", &self.config.refresh_ttl)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
