// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Queryable audit logger that keeps entries in process memory.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog};
use super::AuditLogger;

/// Audit logger backed by a shared `Vec`.
///
/// Clones share storage: hand one clone to the session manager and read
/// recorded auth events back through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLogger {
    entries: Arc<RwLock<Vec<AuditLog>>>,
}

impl InMemoryAuditLogger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry, oldest first.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.entries.read().clone()
    }

    /// Entries recorded for `action`, successful or not.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.collect(|e| e.action == action)
    }

    /// Entries whose result is a failure.
    pub fn failures(&self) -> Vec<AuditLog> {
        self.collect(|e| !e.result.is_success())
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn collect(&self, keep: impl Fn(&AuditLog) -> bool) -> Vec<AuditLog> {
        self.entries.read().iter().filter(|e| keep(e)).cloned().collect()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        self.entries.write().push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let mut found = self.collect(|e| filter.matches(e));
        found.sort_by_key(|e| e.timestamp);
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_query(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{ActionResult, AuditEntity};

    fn login(session_id: &str, user_id: &str, username: &str) -> AuditLog {
        AuditLog::new(AuditAction::Login, AuditEntity::session(session_id))
            .with_actor(user_id, username)
            .with_session_id(session_id)
    }

    #[tokio::test]
    async fn test_records_by_action() {
        let logger = InMemoryAuditLogger::new();
        assert!(logger.is_empty());

        logger.log(login("s1", "u1", "alice")).await.unwrap();
        logger
            .log(AuditLog::new(AuditAction::Logout, AuditEntity::session("s1")))
            .await
            .unwrap();

        assert_eq!(logger.len(), 2);
        assert_eq!(logger.entries_for_action(AuditAction::Login).len(), 1);
        assert!(logger.entries_for_action(AuditAction::TokenRefresh).is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_separated() {
        let logger = InMemoryAuditLogger::new();
        let shared = logger.clone();

        shared.log(login("s1", "u1", "alice")).await.unwrap();
        shared
            .log(
                AuditLog::new(AuditAction::Login, AuditEntity::user("u2"))
                    .with_actor("u2", "bob")
                    .with_result(ActionResult::failure("invalid password")),
            )
            .await
            .unwrap();

        let failures = logger.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].actor_user_id(), Some("u2"));
        assert_eq!(logger.entries_for_action(AuditAction::Login).len(), 2);
    }

    #[tokio::test]
    async fn test_query_by_actor_and_session() {
        let logger = InMemoryAuditLogger::new();
        logger.log(login("s1", "u1", "alice")).await.unwrap();
        logger.log(login("s2", "u2", "bob")).await.unwrap();
        logger.log(login("s3", "u1", "alice")).await.unwrap();

        let alice = logger.query(AuditFilter::new().user("u1")).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice[0].timestamp <= alice[1].timestamp);

        let s2 = logger.query(AuditFilter::new().session("s2")).await.unwrap();
        assert_eq!(s2.len(), 1);

        let limited = logger.query(AuditFilter::new().limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert!(logger.supports_query());
    }
}
