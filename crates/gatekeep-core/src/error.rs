// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for authentication and authorization.
//!
//! [`AuthError`] is the single error surfaced by every gatekeep operation.
//! Each variant carries a stable [`error_code`](AuthError::error_code) and an
//! HTTP status hint so that an outer transport layer can render it without
//! matching on message text.

use thiserror::Error;

/// Result type alias for gatekeep operations.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// AuthError
// =============================================================================

/// Top-level authentication and authorization error.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The referenced user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The user exists but has been deactivated.
    #[error("User account is inactive")]
    UserInactive,

    /// The refresh token failed validation or does not match its session.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// The session has been revoked.
    #[error("Session has been revoked")]
    SessionRevoked,

    /// The session does not exist or is not visible to the caller.
    #[error("Session not found")]
    SessionNotFound,

    /// The token is past its expiry.
    #[error("Token has expired")]
    ExpiredToken,

    /// The token is malformed, badly signed, or of the wrong type.
    #[error("Invalid token")]
    InvalidToken,

    /// The token decoded but its claims are missing or malformed.
    #[error("Invalid token claims")]
    InvalidClaims,

    /// No usable bearer credentials were presented.
    #[error("Missing or malformed authorization header")]
    MissingCredentials,

    /// The caller lacks a required permission.
    #[error("Permission denied: {code}")]
    PermissionDenied {
        /// The permission code (or codes) that was required.
        code: String,
    },

    /// Token signing failed.
    #[error("Token signing failed: {message}")]
    TokenSigning {
        /// Error message.
        message: String,
    },

    /// Password hashing or verification backend failed.
    #[error("Password hashing failed: {message}")]
    PasswordHashing {
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a permission denied error.
    pub fn permission_denied(code: impl Into<String>) -> Self {
        Self::PermissionDenied { code: code.into() }
    }

    /// Creates a token signing error.
    pub fn token_signing(message: impl Into<String>) -> Self {
        Self::TokenSigning {
            message: message.into(),
        }
    }

    /// Creates a password hashing error.
    pub fn password_hashing(message: impl Into<String>) -> Self {
        Self::PasswordHashing {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code hint for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials
            | AuthError::UserInactive
            | AuthError::InvalidRefreshToken
            | AuthError::SessionRevoked
            | AuthError::ExpiredToken
            | AuthError::InvalidToken
            | AuthError::InvalidClaims
            | AuthError::MissingCredentials => 401,
            AuthError::PermissionDenied { .. } => 403,
            AuthError::UserNotFound | AuthError::SessionNotFound => 404,
            AuthError::TokenSigning { .. }
            | AuthError::PasswordHashing { .. }
            | AuthError::Config(_)
            | AuthError::Repository(_) => 500,
        }
    }

    /// Returns the stable error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::UserInactive => "USER_INACTIVE",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::SessionRevoked => "SESSION_REVOKED",
            AuthError::SessionNotFound => "SESSION_NOT_FOUND",
            AuthError::ExpiredToken => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InvalidClaims => "INVALID_CLAIMS",
            AuthError::MissingCredentials => "MISSING_CREDENTIALS",
            AuthError::PermissionDenied { .. } => "FORBIDDEN",
            AuthError::TokenSigning { .. } => "TOKEN_SIGNING_ERROR",
            AuthError::PasswordHashing { .. } => "PASSWORD_HASHING_ERROR",
            AuthError::Config(_) => "CONFIG_ERROR",
            AuthError::Repository(_) => "REPOSITORY_ERROR",
        }
    }

    /// Returns a message that is safe to show to end users.
    ///
    /// Server-side failures collapse to a generic message so that backend
    /// details never leak to clients.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid username or password".to_string(),
            AuthError::UserInactive => "User account is inactive".to_string(),
            AuthError::InvalidRefreshToken | AuthError::InvalidToken | AuthError::InvalidClaims => {
                "Invalid token".to_string()
            }
            AuthError::ExpiredToken => "Token has expired".to_string(),
            AuthError::SessionRevoked => "Session has been revoked".to_string(),
            AuthError::SessionNotFound => "Session not found".to_string(),
            AuthError::UserNotFound => "User not found".to_string(),
            AuthError::MissingCredentials => "Authentication required".to_string(),
            AuthError::PermissionDenied { .. } => "Permission denied".to_string(),
            AuthError::TokenSigning { .. }
            | AuthError::PasswordHashing { .. }
            | AuthError::Config(_)
            | AuthError::Repository(_) => "Internal server error".to_string(),
        }
    }

    /// Returns `true` if the operation may succeed when retried unchanged.
    ///
    /// No gatekeep error is retried automatically; only transient backend
    /// failures report `true` so that callers can decide for themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Repository(_))
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

// =============================================================================
// RepositoryError
// =============================================================================

/// Opaque failure reported by a repository implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RepositoryError {
    /// Error message.
    pub message: String,
    /// Underlying error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RepositoryError {
    /// Creates a repository error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a repository error wrapping an underlying error.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing.
    #[error("Missing configuration value: {field}")]
    Missing {
        /// Field name.
        field: String,
    },

    /// A value failed validation.
    #[error("Invalid configuration for {field}: {message}")]
    Invalid {
        /// Field name.
        field: String,
        /// Validation message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    /// Creates an invalid field error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
