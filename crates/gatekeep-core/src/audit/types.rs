// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core audit log types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Module name recorded on every event emitted by the auth core.
pub const AUTH_MODULE: &str = "auth";

/// Table name recorded for session events.
pub const SESSION_TABLE: &str = "login_sessions";

/// Table name recorded for user events.
pub const USER_TABLE: &str = "users";

// =============================================================================
// Audit Log Entry
// =============================================================================

/// A single audit log entry describing a business data change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique log entry ID.
    pub id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Owning module, e.g. `auth`.
    pub module: String,

    /// The business action that was performed.
    pub action: AuditAction,

    /// Logical data operation.
    pub operation: AuditOperation,

    /// The entity that was affected.
    pub entity: AuditEntity,

    /// Inserted, deleted, or changed data. Never contains secrets.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,

    /// Human meaningful key of the affected record, e.g. a username.
    pub business_key: String,

    /// Who performed the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<AuditActor>,

    /// Client IP address as reported by the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Session the action was performed in or on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// The result of the action.
    pub result: ActionResult,

    /// One-line description for humans.
    pub summary: String,
}

impl AuditLog {
    /// Creates a new audit log entry in the auth module.
    pub fn new(action: AuditAction, entity: AuditEntity) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            module: AUTH_MODULE.to_string(),
            operation: action.default_operation(),
            action,
            entity,
            data: serde_json::Value::Null,
            business_key: String::new(),
            actor: None,
            client_ip: None,
            session_id: None,
            result: ActionResult::Success,
            summary: String::new(),
        }
    }

    /// Sets the actor.
    pub fn with_actor(mut self, user_id: impl Into<String>, username: impl Into<String>) -> Self {
        self.actor = Some(AuditActor {
            user_id: user_id.into(),
            username: username.into(),
        });
        self
    }

    /// Sets the client IP.
    pub fn with_client_ip(mut self, ip: Option<String>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets the session ID.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the business key.
    pub fn with_business_key(mut self, key: impl Into<String>) -> Self {
        self.business_key = key.into();
        self
    }

    /// Sets the data payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Sets the result.
    pub fn with_result(mut self, result: ActionResult) -> Self {
        self.result = result;
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Returns the actor's user ID, if any.
    pub fn actor_user_id(&self) -> Option<&str> {
        self.actor.as_ref().map(|a| a.user_id.as_str())
    }
}

// =============================================================================
// Actor & Entity
// =============================================================================

/// The user performing an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    /// User ID.
    pub user_id: String,
    /// Username at the time of the action.
    pub username: String,
}

/// The record affected by an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntity {
    /// Table or collection name.
    pub table: String,
    /// Primary key columns and values.
    pub primary_key: BTreeMap<String, String>,
}

impl AuditEntity {
    /// Creates an entity with a single `id` primary key.
    pub fn new(table: impl Into<String>, id: impl Into<String>) -> Self {
        let mut primary_key = BTreeMap::new();
        primary_key.insert("id".to_string(), id.into());
        Self {
            table: table.into(),
            primary_key,
        }
    }

    /// Creates a session entity.
    pub fn session(session_id: impl Into<String>) -> Self {
        Self::new(SESSION_TABLE, session_id)
    }

    /// Creates a user entity.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(USER_TABLE, user_id)
    }

    /// Returns the `id` primary key value, if present.
    pub fn id(&self) -> Option<&str> {
        self.primary_key.get("id").map(String::as_str)
    }
}

// =============================================================================
// Audit Action & Operation
// =============================================================================

/// Types of auditable auth actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Successful login; a session was created.
    Login,
    /// Logout; the session was revoked by its owner.
    Logout,
    /// Refresh rotation; one session replaced by another.
    TokenRefresh,
    /// A session was revoked through the management API.
    SessionRevoke,
    /// Password changed; all sessions were revoked.
    PasswordChange,
}

impl AuditAction {
    /// Returns the action as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::TokenRefresh => "token_refresh",
            AuditAction::SessionRevoke => "session_revoke",
            AuditAction::PasswordChange => "password_change",
        }
    }

    /// Returns the data operation the action implies.
    pub fn default_operation(&self) -> AuditOperation {
        match self {
            AuditAction::Login | AuditAction::TokenRefresh => AuditOperation::Insert,
            AuditAction::Logout | AuditAction::SessionRevoke => AuditOperation::Delete,
            AuditAction::PasswordChange => AuditOperation::Update,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Logical data operation recorded with an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOperation {
    /// A record was created.
    Insert,
    /// A record was changed.
    Update,
    /// A record was removed or revoked.
    Delete,
}

impl AuditOperation {
    /// Returns the operation as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Insert => "INSERT",
            AuditOperation::Update => "UPDATE",
            AuditOperation::Delete => "DELETE",
        }
    }
}

// =============================================================================
// Action Result
// =============================================================================

/// The result of an audited action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ActionResult {
    /// Action completed successfully.
    #[default]
    #[serde(rename = "success")]
    Success,

    /// Action failed.
    #[serde(rename = "failure")]
    Failure {
        /// Reason for failure.
        reason: String,
    },
}

impl ActionResult {
    /// Creates a failure result.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the action was successful.
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success)
    }
}

// =============================================================================
// Audit Filter
// =============================================================================

/// Filter for querying audit logs.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by actor user ID.
    pub user_id: Option<String>,
    /// Filter by action.
    pub action: Option<AuditAction>,
    /// Filter by session ID.
    pub session_id: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Creates an empty filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by actor user ID.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Filters by action.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Filters by session ID.
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks if a log entry matches this filter.
    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(ref user_id) = self.user_id {
            if log.actor_user_id() != Some(user_id.as_str()) {
                return false;
            }
        }

        if let Some(action) = self.action {
            if log.action != action {
                return false;
            }
        }

        if let Some(ref session_id) = self.session_id {
            if log.session_id.as_ref() != Some(session_id) {
                return false;
            }
        }

        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operation() {
        let log = AuditLog::new(AuditAction::Login, AuditEntity::session("s1"));
        assert_eq!(log.operation, AuditOperation::Insert);
        assert_eq!(log.module, AUTH_MODULE);

        let log = AuditLog::new(AuditAction::SessionRevoke, AuditEntity::session("s1"));
        assert_eq!(log.operation, AuditOperation::Delete);
    }

    #[test]
    fn test_entity_primary_key() {
        let entity = AuditEntity::session("abc");
        assert_eq!(entity.table, SESSION_TABLE);
        assert_eq!(entity.id(), Some("abc"));
    }

    #[test]
    fn test_filter_matches() {
        let log = AuditLog::new(AuditAction::Login, AuditEntity::session("s1"))
            .with_actor("u1", "alice")
            .with_session_id("s1");

        assert!(AuditFilter::new().matches(&log));
        assert!(AuditFilter::new().user("u1").matches(&log));
        assert!(!AuditFilter::new().user("u2").matches(&log));
        assert!(AuditFilter::new().action(AuditAction::Login).matches(&log));
        assert!(!AuditFilter::new().action(AuditAction::Logout).matches(&log));
        assert!(AuditFilter::new().session("s1").matches(&log));
        assert!(!AuditFilter::new().session("s2").matches(&log));
    }

    #[test]
    fn test_serialization_shape() {
        let log = AuditLog::new(AuditAction::Login, AuditEntity::session("s1"))
            .with_actor("u1", "alice")
            .with_business_key("alice")
            .with_summary("User alice logged in");

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["action"], "login");
        assert_eq!(json["operation"], "INSERT");
        assert_eq!(json["entity"]["table"], "login_sessions");
        assert_eq!(json["actor"]["username"], "alice");
        assert_eq!(json["result"]["status"], "success");
    }

    #[test]
    fn test_failure_result_shape() {
        let log = AuditLog::new(AuditAction::Login, AuditEntity::user("u1"))
            .with_result(ActionResult::failure("invalid password"));

        assert!(!log.result.is_success());
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["result"]["status"], "failure");
        assert_eq!(json["result"]["reason"], "invalid password");
        assert_eq!(json["entity"]["table"], "users");
    }
}
