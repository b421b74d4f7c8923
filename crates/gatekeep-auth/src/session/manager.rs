// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle: login, refresh rotation, revocation, liveness.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatekeep_core::audit::{
    ActionResult, AuditAction, AuditEntity, AuditLog, AuditLogger, NoOpAuditLogger,
};
use gatekeep_core::{
    AuthError, AuthResult, ConfigError, LoginSession, PermissionRepository, RotateOutcome,
    SessionRepository, User, UserRepository, UserWithPermissions,
};

use crate::config::AuthConfig;
use crate::password::{Argon2Hasher, PasswordHasher};
use crate::permission::{PermissionCache, PermissionResolver};
use crate::token::{hash_token, TokenManager, TokenPair};

// =============================================================================
// Requests & Responses
// =============================================================================

/// Credentials and client metadata for a login attempt.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Login name, or an email address.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Client device description.
    #[serde(default)]
    pub device_info: Option<String>,
    /// Client IP address.
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl LoginRequest {
    /// Creates a request without client metadata.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            device_info: None,
            ip_address: None,
        }
    }

    /// Sets the client device description.
    pub fn with_device(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }

    /// Sets the client IP address.
    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .field("device_info", &self.device_info)
            .field("ip_address", &self.ip_address)
            .finish()
    }
}

/// Public view of the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Role names.
    pub roles: Vec<String>,
    /// Allowed permission codes.
    pub permissions: Vec<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub user: UserSummary,
    /// Token pair bound to the new session.
    pub tokens: TokenPair,
    /// The new session ID.
    pub session_id: String,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Owns the session lifecycle.
///
/// Each session moves from active to revoked exactly once. All operations are
/// cancel-safe in the sense that dropping the future stops further repository
/// calls; a write already issued is not rolled back.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    resolver: PermissionResolver,
    tokens: TokenManager,
    hasher: Arc<dyn PasswordHasher>,
    audit: Arc<dyn AuditLogger>,
}

impl SessionManager {
    /// Creates a builder for a session manager.
    pub fn builder(config: AuthConfig) -> SessionManagerBuilder {
        SessionManagerBuilder::new(config)
    }

    /// Returns the token manager.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Returns the permission resolver.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Authenticates a user and opens a new session.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginOutcome> {
        let LoginRequest {
            username,
            password,
            device_info,
            ip_address,
        } = request;

        let Some(user) = self.find_login_user(&username).await? else {
            self.burn_verification(password).await;
            tracing::debug!(username = %username, "Login rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password.clone(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            self.emit_login_failure(&user, ip_address, "invalid password").await;
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "Login rejected: user inactive");
            self.emit_login_failure(&user, ip_address, "user inactive").await;
            return Err(AuthError::UserInactive);
        }

        self.rehash_if_needed(&user, password).await;

        let session_id = Uuid::new_v4().to_string();
        let tokens = self.tokens.generate_token_pair(&user.id, &session_id)?;
        let session = LoginSession::new(&session_id, &user.id, hash_token(&tokens.refresh_token))
            .with_client(device_info.clone(), ip_address.clone());
        self.sessions.create(&session).await?;

        if let Err(e) = self.users.update_last_login(&user.id).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to update last login");
        }

        let summary = self.user_summary(&user).await;

        self.emit(
            AuditLog::new(AuditAction::Login, AuditEntity::session(&session_id))
                .with_actor(&user.id, &user.username)
                .with_business_key(&user.username)
                .with_client_ip(ip_address.clone())
                .with_session_id(&session_id)
                .with_data(serde_json::json!({
                    "session_id": session_id,
                    "user_id": user.id,
                    "device_info": device_info,
                    "ip_address": ip_address,
                }))
                .with_summary(format!("User {} logged in", user.username)),
        )
        .await;

        tracing::info!(user_id = %user.id, session_id = %session_id, "User logged in");

        Ok(LoginOutcome {
            user: summary,
            tokens,
            session_id,
        })
    }

    /// Revokes a session. Unknown or already revoked sessions succeed.
    pub async fn logout(&self, session_id: &str) -> AuthResult<()> {
        let existing = match self.sessions.get_by_id(session_id).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to load session for logout");
                None
            }
        };
        self.sessions.revoke(session_id).await?;

        if let Some(session) = existing.filter(LoginSession::is_active) {
            self.emit(
                AuditLog::new(AuditAction::Logout, AuditEntity::session(&session.id))
                    .with_actor(&session.user_id, self.username_of(&session.user_id).await)
                    .with_business_key(&session.id)
                    .with_client_ip(session.ip_address.clone())
                    .with_session_id(&session.id)
                    .with_summary(format!("Session {} logged out", session.id)),
            )
            .await;
            tracing::info!(user_id = %session.user_id, session_id = %session.id, "User logged out");
        }

        Ok(())
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Exchanges a refresh token for a new pair, rotating the session.
    ///
    /// The old session is revoked and a new one created in one repository
    /// call, so a replayed or concurrently reused refresh token succeeds at
    /// most once.
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.tokens.validate_refresh_token(refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "Refresh rejected: token invalid");
            AuthError::InvalidRefreshToken
        })?;

        let session = self
            .sessions
            .get_by_refresh_token_hash(&hash_token(refresh_token))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.id != claims.session_id || session.user_id != claims.user_id {
            tracing::warn!(
                session_id = %session.id,
                claimed_session_id = %claims.session_id,
                "Refresh rejected: token does not match its session"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        if !session.is_active() {
            tracing::warn!(session_id = %session.id, "Refresh rejected: session revoked");
            return Err(AuthError::SessionRevoked);
        }

        let user = self
            .users
            .get_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        let new_session_id = Uuid::new_v4().to_string();
        let tokens = self.tokens.generate_token_pair(&user.id, &new_session_id)?;
        let new_session =
            LoginSession::new(&new_session_id, &user.id, hash_token(&tokens.refresh_token))
                .with_client(session.device_info.clone(), session.ip_address.clone());

        match self.sessions.rotate(&session.id, &new_session).await? {
            RotateOutcome::Rotated => {}
            RotateOutcome::AlreadyRevoked => {
                tracing::warn!(session_id = %session.id, "Refresh lost rotation race");
                return Err(AuthError::SessionRevoked);
            }
            RotateOutcome::NotFound => return Err(AuthError::SessionNotFound),
        }

        self.emit(
            AuditLog::new(AuditAction::TokenRefresh, AuditEntity::session(&new_session_id))
                .with_actor(&user.id, &user.username)
                .with_business_key(&user.username)
                .with_client_ip(session.ip_address.clone())
                .with_session_id(&new_session_id)
                .with_data(serde_json::json!({
                    "old_session_id": session.id,
                    "new_session_id": new_session_id,
                }))
                .with_summary(format!("Session {} rotated to {}", session.id, new_session_id)),
        )
        .await;

        tracing::info!(
            user_id = %user.id,
            old_session_id = %session.id,
            session_id = %new_session_id,
            "Session rotated"
        );

        Ok(tokens)
    }

    // =========================================================================
    // Session management
    // =========================================================================

    /// Revokes a session on behalf of a user.
    ///
    /// Callers that neither own the session nor are admins get
    /// [`AuthError::SessionNotFound`], so session IDs of other users are not
    /// disclosed.
    pub async fn revoke_session(
        &self,
        requesting_user_id: &str,
        session_id: &str,
        is_admin: bool,
    ) -> AuthResult<()> {
        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.user_id != requesting_user_id && !is_admin {
            tracing::debug!(
                user_id = %requesting_user_id,
                session_id = %session_id,
                "Revoke rejected: not the owner"
            );
            return Err(AuthError::SessionNotFound);
        }

        self.sessions.revoke(session_id).await?;

        self.emit(
            AuditLog::new(AuditAction::SessionRevoke, AuditEntity::session(session_id))
                .with_actor(requesting_user_id, self.username_of(requesting_user_id).await)
                .with_business_key(session_id)
                .with_client_ip(session.ip_address.clone())
                .with_session_id(session_id)
                .with_data(serde_json::json!({
                    "session_id": session_id,
                    "user_id": session.user_id,
                    "device_info": session.device_info,
                }))
                .with_summary(format!("Session {} revoked", session_id)),
        )
        .await;

        tracing::info!(
            user_id = %requesting_user_id,
            session_id = %session_id,
            owner = %session.user_id,
            "Session revoked"
        );
        Ok(())
    }

    /// Revokes every active session of a user.
    pub async fn revoke_all_sessions(&self, user_id: &str) -> AuthResult<()> {
        self.sessions.revoke_all_by_user_id(user_id).await?;
        tracing::info!(user_id = %user_id, "All sessions revoked");
        Ok(())
    }

    /// Records activity on a session.
    pub async fn update_session_activity(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.update_last_seen(session_id).await?;
        Ok(())
    }

    /// Returns the user's active sessions whose refresh window is still open.
    pub async fn get_user_sessions(&self, user_id: &str) -> AuthResult<Vec<LoginSession>> {
        let refresh_ttl = self.tokens.refresh_ttl();
        let mut sessions = self.sessions.get_active_by_user_id(user_id).await?;
        sessions.retain(|s| !s.is_expired(refresh_ttl));
        Ok(sessions)
    }

    /// Returns every session the user ever opened, revoked ones included.
    pub async fn get_session_history(&self, user_id: &str) -> AuthResult<Vec<LoginSession>> {
        Ok(self.sessions.get_all_by_user_id(user_id).await?)
    }

    /// Looks up a session by ID, revoked or not.
    pub async fn get_session_by_id(&self, session_id: &str) -> AuthResult<Option<LoginSession>> {
        Ok(self.sessions.get_by_id(session_id).await?)
    }

    /// Loads the user with roles and effective permissions.
    pub async fn get_current_user(&self, user_id: &str) -> AuthResult<UserWithPermissions> {
        self.resolver
            .get_user_with_permissions(&PermissionCache::new(), user_id)
            .await
    }

    // =========================================================================
    // Password
    // =========================================================================

    /// Changes a user's password and revokes all of its sessions.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .verify_password(current_password.to_string(), user.password_hash.clone())
            .await?
        {
            tracing::debug!(user_id = %user_id, "Password change rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self.hash_password(new_password.to_string()).await?;
        self.users.update_password_hash(user_id, &new_hash).await?;
        self.sessions.revoke_all_by_user_id(user_id).await?;

        self.emit(
            AuditLog::new(AuditAction::PasswordChange, AuditEntity::user(user_id))
                .with_actor(&user.id, &user.username)
                .with_business_key(&user.username)
                .with_data(serde_json::json!({ "changed_columns": ["password_hash"] }))
                .with_summary(format!("User {} changed password", user.username)),
        )
        .await;

        tracing::info!(user_id = %user_id, "Password changed; sessions revoked");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Looks up a login identifier by username, then by email when it
    /// looks like an address.
    async fn find_login_user(&self, identifier: &str) -> AuthResult<Option<User>> {
        if let Some(user) = self.users.get_by_username(identifier).await? {
            return Ok(Some(user));
        }
        if identifier.contains('@') {
            return Ok(self.users.get_by_email(identifier).await?);
        }
        Ok(None)
    }

    async fn emit_login_failure(&self, user: &User, ip_address: Option<String>, reason: &str) {
        self.emit(
            AuditLog::new(AuditAction::Login, AuditEntity::user(&user.id))
                .with_actor(&user.id, &user.username)
                .with_business_key(&user.username)
                .with_client_ip(ip_address)
                .with_result(ActionResult::failure(reason))
                .with_summary(format!("Login failed for {}: {}", user.username, reason)),
        )
        .await;
    }

    async fn verify_password(&self, password: String, hash: String) -> AuthResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::password_hashing(e.to_string()))?
    }

    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::password_hashing(e.to_string()))?
    }

    async fn burn_verification(&self, password: String) {
        let hasher = Arc::clone(&self.hasher);
        let _ = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await;
    }

    async fn rehash_if_needed(&self, user: &User, password: String) {
        if !self.hasher.needs_rehash(&user.password_hash) {
            return;
        }
        let result = match self.hash_password(password).await {
            Ok(hash) => self
                .users
                .update_password_hash(&user.id, &hash)
                .await
                .map_err(AuthError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::info!(user_id = %user.id, "Password hash upgraded"),
            Err(e) => tracing::warn!(user_id = %user.id, error = %e, "Failed to upgrade password hash"),
        }
    }

    async fn user_summary(&self, user: &User) -> UserSummary {
        let roles = match self.users.get_roles_by_user_id(&user.id).await {
            Ok(roles) => roles.into_iter().map(|r| r.name).collect(),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to load roles for login");
                Vec::new()
            }
        };

        let permissions = match self.resolver.resolve_effective_permissions(&user.id).await {
            Ok(effective) => effective.allowed_codes(),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to load permissions for login");
                Vec::new()
            }
        };

        UserSummary {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles,
            permissions,
        }
    }

    async fn username_of(&self, user_id: &str) -> String {
        match self.users.get_by_id(user_id).await {
            Ok(Some(user)) => user.username,
            _ => "unknown".to_string(),
        }
    }

    async fn emit(&self, entry: AuditLog) {
        let action = entry.action;
        if let Err(e) = self.audit.log(entry).await {
            tracing::warn!(action = %action, error = %e, "Failed to write audit log");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("tokens", &self.tokens)
            .field("audit", &self.audit.name())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SessionManagerBuilder
// =============================================================================

/// Builder for [`SessionManager`].
///
/// The three repositories are required. The token manager and password
/// hasher are derived from the configuration unless supplied; audit defaults
/// to [`NoOpAuditLogger`].
pub struct SessionManagerBuilder {
    config: AuthConfig,
    users: Option<Arc<dyn UserRepository>>,
    sessions: Option<Arc<dyn SessionRepository>>,
    permissions: Option<Arc<dyn PermissionRepository>>,
    hasher: Option<Arc<dyn PasswordHasher>>,
    audit: Option<Arc<dyn AuditLogger>>,
}

impl SessionManagerBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            users: None,
            sessions: None,
            permissions: None,
            hasher: None,
            audit: None,
        }
    }

    /// Sets the user repository.
    pub fn users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = Some(users);
        self
    }

    /// Sets the session repository.
    pub fn sessions(mut self, sessions: Arc<dyn SessionRepository>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Sets the permission repository.
    pub fn permissions(mut self, permissions: Arc<dyn PermissionRepository>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Overrides the password hasher.
    pub fn hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Sets the audit logger.
    pub fn audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Builds the session manager.
    pub fn build(self) -> AuthResult<SessionManager> {
        self.config.validate()?;

        let users = self.users.ok_or_else(|| ConfigError::missing("users repository"))?;
        let sessions = self
            .sessions
            .ok_or_else(|| ConfigError::missing("sessions repository"))?;
        let permissions = self
            .permissions
            .ok_or_else(|| ConfigError::missing("permissions repository"))?;

        let hasher = match self.hasher {
            Some(hasher) => hasher,
            None => Arc::new(Argon2Hasher::new(&self.config.password)?),
        };

        Ok(SessionManager {
            resolver: PermissionResolver::new(Arc::clone(&users), permissions),
            tokens: TokenManager::new(self.config.token)?,
            users,
            sessions,
            hasher,
            audit: self.audit.unwrap_or_else(|| Arc::new(NoOpAuditLogger::new())),
        })
    }
}
