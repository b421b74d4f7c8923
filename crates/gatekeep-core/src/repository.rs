// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persistence contracts consumed by the auth core.
//!
//! Implementations live outside this workspace (SQL, key-value stores, or the
//! in-memory mocks in `gatekeep-tests`). Every method reports failures as an
//! opaque [`RepositoryError`]; "not found" is expressed with `Option`, never
//! as an error.

use async_trait::async_trait;

use crate::entity::{LoginSession, Permission, Role, User, UserPermissionOverride};
use crate::error::RepositoryError;

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// =============================================================================
// UserRepository
// =============================================================================

/// Read access to users plus the two mutations the auth core performs.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks up a user by ID.
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<User>>;

    /// Looks up a user by login name.
    async fn get_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    /// Looks up a user by email address.
    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Records a successful login at the current time.
    async fn update_last_login(&self, user_id: &str) -> RepositoryResult<()>;

    /// Replaces the stored password hash.
    async fn update_password_hash(&self, user_id: &str, password_hash: &str)
        -> RepositoryResult<()>;

    /// Returns the roles assigned to a user.
    async fn get_roles_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<Role>>;
}

// =============================================================================
// SessionRepository
// =============================================================================

/// Outcome of an atomic refresh rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateOutcome {
    /// The old session was revoked and the new one created.
    Rotated,
    /// The old session was already revoked; nothing was written.
    AlreadyRevoked,
    /// The old session does not exist; nothing was written.
    NotFound,
}

/// Durable record of login sessions.
///
/// Sessions are never physically deleted through this contract; revocation
/// sets the revocation timestamp once and later revocations are no-ops.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persists a new session.
    async fn create(&self, session: &LoginSession) -> RepositoryResult<()>;

    /// Looks up a session by ID.
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<LoginSession>>;

    /// Looks up a session by the digest of its refresh token.
    async fn get_by_refresh_token_hash(&self, hash: &str)
        -> RepositoryResult<Option<LoginSession>>;

    /// Returns the user's sessions that have not been revoked.
    async fn get_active_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<LoginSession>>;

    /// Returns all of the user's sessions, revoked ones included.
    async fn get_all_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<LoginSession>>;

    /// Sets the last-seen time of a session to now.
    async fn update_last_seen(&self, session_id: &str) -> RepositoryResult<()>;

    /// Revokes a session. Revoking an unknown or revoked session succeeds.
    async fn revoke(&self, session_id: &str) -> RepositoryResult<()>;

    /// Revokes every active session of a user.
    async fn revoke_all_by_user_id(&self, user_id: &str) -> RepositoryResult<()>;

    /// Atomically revokes `old_session_id` and creates `new_session`.
    ///
    /// The revoke is conditional on the old session still being active, and
    /// the create happens only if the revoke did. Of several concurrent calls
    /// for the same old session at most one returns [`RotateOutcome::Rotated`].
    async fn rotate(
        &self,
        old_session_id: &str,
        new_session: &LoginSession,
    ) -> RepositoryResult<RotateOutcome>;
}

// =============================================================================
// PermissionRepository
// =============================================================================

/// Read access to role-derived permissions and per-user overrides.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Returns the permissions granted to the user through any of its roles.
    ///
    /// Duplicates across roles are allowed.
    async fn get_role_permissions(&self, user_id: &str) -> RepositoryResult<Vec<Permission>>;

    /// Returns the user's grant and revoke overrides.
    async fn get_user_overrides(&self, user_id: &str)
        -> RepositoryResult<Vec<UserPermissionOverride>>;
}
