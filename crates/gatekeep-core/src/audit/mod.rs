// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging for authentication events.
//!
//! The auth core records business events (login, logout, refresh rotation,
//! session revocation, password change) through the [`AuditLogger`] trait.
//! Writing those events to durable storage is the job of an outer layer;
//! this module only defines the event shape and a few loggers.
//!
//! # Components
//!
//! - [`AuditLogger`]: Core trait for audit logger implementations
//! - [`AuditLog`]: Structured audit entry (module, action, entity, actor, summary)
//! - [`NoOpAuditLogger`]: Discards everything
//! - [`TracingAuditLogger`]: Emits entries as `tracing` events on the `audit` target
//! - [`InMemoryAuditLogger`]: Queryable in-memory store for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use gatekeep_core::audit::{AuditAction, AuditEntity, AuditLog, AuditLogger};
//!
//! logger.log(
//!     AuditLog::new(AuditAction::Login, AuditEntity::session(&session_id))
//!         .with_actor(&user.id, &user.username)
//!         .with_business_key(&user.username)
//!         .with_summary(format!("User {} logged in", user.username)),
//! ).await?;
//! ```

mod error;
mod memory_logger;
mod tracing_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use memory_logger::InMemoryAuditLogger;
pub use tracing_logger::{TracingAuditLogger, AUDIT_TARGET};
pub use types::{
    ActionResult, AuditAction, AuditActor, AuditEntity, AuditFilter, AuditLog, AuditOperation,
    AUTH_MODULE, SESSION_TABLE, USER_TABLE,
};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// Trait for audit logger implementations.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Logs an audit entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Logs multiple audit entries in a batch.
    ///
    /// The default implementation calls `log` for each entry.
    async fn log_batch(&self, entries: Vec<AuditLog>) -> AuditResult<()> {
        for entry in entries {
            self.log(entry).await?;
        }
        Ok(())
    }

    /// Queries audit logs with the given filter.
    ///
    /// Loggers that cannot query return [`AuditError::QueryNotSupported`].
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Flushes any buffered logs.
    async fn flush(&self) -> AuditResult<()>;

    /// Returns the logger name for identification.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger supports querying.
    fn supports_query(&self) -> bool {
        false
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// A no-op audit logger that discards all entries.
#[derive(Debug, Default, Clone)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// Creates a new no-op logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// =============================================================================
// Tests
// =============================================================================
