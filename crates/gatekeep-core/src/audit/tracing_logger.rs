// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logger that emits entries as structured `tracing` events.

use async_trait::async_trait;

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog};
use super::AuditLogger;

/// Target used for every audit event.
pub const AUDIT_TARGET: &str = "audit";

/// Writes each entry as an `info` event on the [`AUDIT_TARGET`] target.
///
/// The full entry is attached as a JSON `entry` field so that a JSON
/// subscriber layer can route audit events to a dedicated sink.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// Creates a new tracing logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let json = serde_json::to_string(&entry)?;
        tracing::info!(
            target: AUDIT_TARGET,
            module = %entry.module,
            action = %entry.action,
            operation = entry.operation.as_str(),
            table = %entry.entity.table,
            business_key = %entry.business_key,
            actor = entry.actor_user_id().unwrap_or("-"),
            ip = entry.client_ip.as_deref().unwrap_or("-"),
            entry = %json,
            "{}",
            entry.summary
        );
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::query_not_supported("tracing"))
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditEntity};

    #[tokio::test]
    async fn test_tracing_logger() {
        let logger = TracingAuditLogger::new();
        let entry = AuditLog::new(AuditAction::Logout, AuditEntity::session("s1"))
            .with_summary("Session s1 revoked");

        assert!(logger.log(entry).await.is_ok());
        assert!(!logger.supports_query());
        assert!(matches!(
            logger.query(AuditFilter::new()).await,
            Err(AuditError::QueryNotSupported { .. })
        ));
    }
}
