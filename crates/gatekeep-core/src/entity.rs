// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Domain entities for authentication and authorization.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// An account that can authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Encoded password hash. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Time of the last successful login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with the given password hash.
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the user as inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

// =============================================================================
// Role & Permission
// =============================================================================

/// A business action that can be authorized, coded as `domain.action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique permission ID.
    pub id: String,
    /// Globally unique code, e.g. `billing.read`.
    pub code: String,
    /// Domain part of the code.
    pub domain: String,
    /// Action part of the code.
    pub action: String,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Permission {
    /// Creates a permission from its `domain.action` code.
    ///
    /// A code without a dot is kept whole as the domain with an empty action.
    pub fn from_code(id: impl Into<String>, code: impl Into<String>) -> Self {
        let code = code.into();
        let (domain, action) = match code.split_once('.') {
            Some((d, a)) => (d.to_string(), a.to_string()),
            None => (code.clone(), String::new()),
        };
        Self {
            id: id.into(),
            code,
            domain,
            action,
            description: String::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A named permission template assigned to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role ID.
    pub id: String,
    /// Role name, e.g. `admin`.
    pub name: String,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Permissions granted by the role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Creates a role without permissions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            permissions: Vec::new(),
        }
    }

    /// Adds a permission to the role.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }
}

/// Kind of per-user permission override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideType {
    /// Grants a permission the user's roles do not.
    Grant,
    /// Removes a permission regardless of roles or grants.
    Revoke,
}

impl OverrideType {
    /// Returns the override type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideType::Grant => "grant",
            OverrideType::Revoke => "revoke",
        }
    }
}

impl std::fmt::Display for OverrideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-user exception to role-derived permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    /// The user the override applies to.
    pub user_id: String,
    /// The permission being granted or revoked.
    pub permission: Permission,
    /// Grant or revoke.
    #[serde(rename = "type")]
    pub override_type: OverrideType,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl UserPermissionOverride {
    /// Creates a grant override.
    pub fn grant(user_id: impl Into<String>, permission: Permission) -> Self {
        Self::new(user_id, permission, OverrideType::Grant)
    }

    /// Creates a revoke override.
    pub fn revoke(user_id: impl Into<String>, permission: Permission) -> Self {
        Self::new(user_id, permission, OverrideType::Revoke)
    }

    fn new(user_id: impl Into<String>, permission: Permission, override_type: OverrideType) -> Self {
        Self {
            user_id: user_id.into(),
            permission,
            override_type,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// LoginSession
// =============================================================================

/// A server-side login session bound to one refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    /// Session ID (UUID).
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Hex SHA-256 digest of the current refresh token. Never serialized.
    #[serde(skip_serializing, default)]
    pub refresh_token_hash: String,
    /// Client device description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last observed activity.
    pub last_seen_at: DateTime<Utc>,
    /// Revocation time; `None` while active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl LoginSession {
    /// Creates an active session.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        refresh_token_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            refresh_token_hash: refresh_token_hash.into(),
            device_info: None,
            ip_address: None,
            created_at: now,
            last_seen_at: now,
            revoked_at: None,
        }
    }

    /// Sets the client metadata.
    pub fn with_client(mut self, device_info: Option<String>, ip_address: Option<String>) -> Self {
        self.device_info = device_info;
        self.ip_address = ip_address;
        self
    }

    /// Returns `true` unless the session has been revoked.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }

    /// Returns `true` if the session is older than `max_age`.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at);
        match age.to_std() {
            Ok(age) => age > max_age,
            Err(_) => false,
        }
    }
}

// =============================================================================
// EffectivePermissions
// =============================================================================

/// Resolved permission map for one user.
///
/// Revoked codes are kept with `false` so a revoke is distinguishable from a
/// permission that was never granted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectivePermissions(HashMap<String, bool>);

impl EffectivePermissions {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the decision for a code.
    pub fn set(&mut self, code: impl Into<String>, allowed: bool) {
        self.0.insert(code.into(), allowed);
    }

    /// Returns `true` if the code is present and allowed.
    pub fn allows(&self, code: &str) -> bool {
        self.0.get(code).copied().unwrap_or(false)
    }

    /// Returns the explicit decision for a code, if any.
    pub fn decision(&self, code: &str) -> Option<bool> {
        self.0.get(code).copied()
    }

    /// Returns the allowed codes, sorted.
    pub fn allowed_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .0
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(code, _)| code.clone())
            .collect();
        codes.sort();
        codes
    }

    /// Returns the number of entries, including revoked ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &HashMap<String, bool> {
        &self.0
    }
}

impl FromIterator<(String, bool)> for EffectivePermissions {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// UserWithPermissions
// =============================================================================

/// A user with its roles and resolved effective permissions.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithPermissions {
    /// The user.
    #[serde(flatten)]
    pub user: User,
    /// Assigned roles.
    pub roles: Vec<Role>,
    /// Resolved permissions.
    #[serde(skip)]
    pub permissions: EffectivePermissions,
}

impl UserWithPermissions {
    /// Returns `true` if the user holds the permission.
    pub fn can(&self, code: &str) -> bool {
        self.permissions.allows(code)
    }

    /// Returns `true` if the user has a role with the given name.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    /// Returns the allowed permission codes.
    pub fn permission_codes(&self) -> Vec<String> {
        self.permissions.allowed_codes()
    }

    /// Returns the role names.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_from_code() {
        let p = Permission::from_code("p1", "billing.read");
        assert_eq!(p.domain, "billing");
        assert_eq!(p.action, "read");

        let p = Permission::from_code("p2", "dashboard");
        assert_eq!(p.domain, "dashboard");
        assert!(p.action.is_empty());
    }

    #[test]
    fn test_session_activity() {
        let mut session = LoginSession::new("s1", "u1", "hash");
        assert!(session.is_active());
        session.revoked_at = Some(Utc::now());
        assert!(!session.is_active());
    }

    #[test]
    fn test_session_expiry() {
        let mut session = LoginSession::new("s1", "u1", "hash");
        assert!(!session.is_expired(Duration::from_secs(60)));
        session.created_at = Utc::now() - chrono::Duration::seconds(120);
        assert!(session.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn test_session_hash_not_serialized() {
        let session = LoginSession::new("s1", "u1", "secret-digest");
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("secret-digest"));
    }

    #[test]
    fn test_effective_permissions() {
        let perms: EffectivePermissions = vec![
            ("billing.read".to_string(), true),
            ("billing.write".to_string(), false),
        ]
        .into_iter()
        .collect();

        assert!(perms.allows("billing.read"));
        assert!(!perms.allows("billing.write"));
        assert!(!perms.allows("unknown"));
        assert_eq!(perms.decision("billing.write"), Some(false));
        assert_eq!(perms.allowed_codes(), vec!["billing.read".to_string()]);
    }

    #[test]
    fn test_user_with_permissions() {
        let mut perms = EffectivePermissions::new();
        perms.set("patient.read", true);
        let uwp = UserWithPermissions {
            user: User::new("u1", "alice", "alice@example.com", "x"),
            roles: vec![Role::new("r1", "doctor")],
            permissions: perms,
        };

        assert!(uwp.can("patient.read"));
        assert!(!uwp.can("patient.delete"));
        assert!(uwp.has_role("doctor"));
        assert!(!uwp.has_role("admin"));
        assert_eq!(uwp.permission_codes(), vec!["patient.read".to_string()]);
    }
}
