// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit error types.

use thiserror::Error;

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors that can occur during audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Query not supported by this logger.
    #[error("Query not supported by this logger: {logger_type}")]
    QueryNotSupported {
        /// The type of logger that doesn't support queries.
        logger_type: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl AuditError {
    /// Creates a query not supported error.
    pub fn query_not_supported(logger_type: impl Into<String>) -> Self {
        Self::QueryNotSupported {
            logger_type: logger_type.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
