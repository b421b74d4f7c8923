// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! In-memory repositories for exercising the auth core without a database.
//!
//! Every mock counts its calls and supports failure injection, so tests can
//! assert both on outcomes and on how often a backend was consulted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use gatekeep_core::{
    LoginSession, Permission, PermissionRepository, RepositoryError, RepositoryResult, Role,
    RotateOutcome, SessionRepository, User, UserPermissionOverride, UserRepository,
};

fn injected() -> RepositoryError {
    RepositoryError::new("injected failure")
}

// =============================================================================
// Mock User Repository
// =============================================================================

/// In-memory user store with role assignments.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
    roles: Mutex<HashMap<String, Vec<Role>>>,

    /// Fail every call.
    fail_all: AtomicBool,
    /// Fail role lookups only.
    fail_roles: AtomicBool,
    /// Fail last-login updates only.
    fail_last_login: AtomicBool,

    lookup_count: AtomicU64,
    last_login_count: AtomicU64,
    password_update_count: AtomicU64,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub fn insert(&self, user: User) {
        self.users.lock().insert(user.id.clone(), user);
    }

    /// Assigns a role to a user.
    pub fn assign_role(&self, user_id: &str, role: Role) {
        self.roles
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .push(role);
    }

    /// Returns a stored user.
    pub fn user(&self, user_id: &str) -> Option<User> {
        self.users.lock().get(user_id).cloned()
    }

    /// Activates or deactivates a user.
    pub fn set_active(&self, user_id: &str, active: bool) {
        if let Some(user) = self.users.lock().get_mut(user_id) {
            user.is_active = active;
        }
    }

    /// Makes every call fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Makes role lookups fail.
    pub fn fail_roles(&self, fail: bool) {
        self.fail_roles.store(fail, Ordering::SeqCst);
    }

    /// Makes last-login updates fail.
    pub fn fail_last_login(&self, fail: bool) {
        self.fail_last_login.store(fail, Ordering::SeqCst);
    }

    /// Number of user lookups.
    pub fn lookup_count(&self) -> u64 {
        self.lookup_count.load(Ordering::SeqCst)
    }

    /// Number of last-login updates.
    pub fn last_login_count(&self) -> u64 {
        self.last_login_count.load(Ordering::SeqCst)
    }

    /// Number of password hash updates.
    pub fn password_update_count(&self) -> u64 {
        self.password_update_count.load(Ordering::SeqCst)
    }

    /// Roles assigned to a user.
    pub fn roles_of(&self, user_id: &str) -> Vec<Role> {
        self.roles.lock().get(user_id).cloned().unwrap_or_default()
    }

    fn check(&self) -> RepositoryResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        self.check()?;
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().get(id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        self.check()?;
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.check()?;
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().values().find(|u| u.email == email).cloned())
    }

    async fn update_last_login(&self, user_id: &str) -> RepositoryResult<()> {
        self.check()?;
        if self.fail_last_login.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.last_login_count.fetch_add(1, Ordering::SeqCst);
        if let Some(user) = self.users.lock().get_mut(user_id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> RepositoryResult<()> {
        self.check()?;
        self.password_update_count.fetch_add(1, Ordering::SeqCst);
        if let Some(user) = self.users.lock().get_mut(user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get_roles_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<Role>> {
        self.check()?;
        if self.fail_roles.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(self.roles_of(user_id))
    }
}

// =============================================================================
// Mock Session Repository
// =============================================================================

/// In-memory session store with an atomic `rotate`.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, LoginSession>>,

    /// Fail every call.
    fail_all: AtomicBool,
    /// Fail last-seen updates only.
    fail_last_seen: AtomicBool,
    /// Fail lookups by ID only.
    fail_lookup: AtomicBool,

    last_seen_count: AtomicU64,
    rotate_count: AtomicU64,
}

impl InMemorySessionRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored session.
    pub fn session(&self, id: &str) -> Option<LoginSession> {
        self.sessions.lock().get(id).cloned()
    }

    /// Moves a session's creation time `age` into the past.
    pub fn backdate(&self, id: &str, age: Duration) {
        if let Some(session) = self.sessions.lock().get_mut(id) {
            if let Ok(age) = chrono::Duration::from_std(age) {
                session.created_at = session.created_at - age;
            }
        }
    }

    /// Returns every stored session.
    pub fn all(&self) -> Vec<LoginSession> {
        self.sessions.lock().values().cloned().collect()
    }

    /// Number of stored sessions, revoked ones included.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns `true` if no session is stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Makes every call fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Makes last-seen updates fail.
    pub fn fail_last_seen(&self, fail: bool) {
        self.fail_last_seen.store(fail, Ordering::SeqCst);
    }

    /// Makes lookups by ID fail.
    pub fn fail_lookup(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    /// Number of successful last-seen updates.
    pub fn last_seen_count(&self) -> u64 {
        self.last_seen_count.load(Ordering::SeqCst)
    }

    /// Number of rotate calls.
    pub fn rotate_count(&self) -> u64 {
        self.rotate_count.load(Ordering::SeqCst)
    }

    fn check(&self) -> RepositoryResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &LoginSession) -> RepositoryResult<()> {
        self.check()?;
        self.sessions
            .lock()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<LoginSession>> {
        self.check()?;
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(self.session(id))
    }

    async fn get_by_refresh_token_hash(&self, hash: &str) -> RepositoryResult<Option<LoginSession>> {
        self.check()?;
        Ok(self
            .sessions
            .lock()
            .values()
            .find(|s| s.refresh_token_hash == hash)
            .cloned())
    }

    async fn get_active_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<LoginSession>> {
        self.check()?;
        Ok(self
            .sessions
            .lock()
            .values()
            .filter(|s| s.user_id == user_id && s.is_active())
            .cloned()
            .collect())
    }

    async fn get_all_by_user_id(&self, user_id: &str) -> RepositoryResult<Vec<LoginSession>> {
        self.check()?;
        Ok(self
            .sessions
            .lock()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_last_seen(&self, session_id: &str) -> RepositoryResult<()> {
        self.check()?;
        if self.fail_last_seen.load(Ordering::SeqCst) {
            return Err(injected());
        }
        if let Some(session) = self.sessions.lock().get_mut(session_id) {
            session.last_seen_at = Utc::now();
        }
        self.last_seen_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn revoke(&self, session_id: &str) -> RepositoryResult<()> {
        self.check()?;
        if let Some(session) = self.sessions.lock().get_mut(session_id) {
            if session.revoked_at.is_none() {
                session.revoked_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn revoke_all_by_user_id(&self, user_id: &str) -> RepositoryResult<()> {
        self.check()?;
        let now = Utc::now();
        for session in self.sessions.lock().values_mut() {
            if session.user_id == user_id && session.revoked_at.is_none() {
                session.revoked_at = Some(now);
            }
        }
        Ok(())
    }

    async fn rotate(
        &self,
        old_session_id: &str,
        new_session: &LoginSession,
    ) -> RepositoryResult<RotateOutcome> {
        self.check()?;
        self.rotate_count.fetch_add(1, Ordering::SeqCst);

        let mut sessions = self.sessions.lock();
        let outcome = match sessions.get(old_session_id).map(LoginSession::is_active) {
            None => RotateOutcome::NotFound,
            Some(false) => RotateOutcome::AlreadyRevoked,
            Some(true) => {
                if let Some(old) = sessions.get_mut(old_session_id) {
                    old.revoked_at = Some(Utc::now());
                }
                sessions.insert(new_session.id.clone(), new_session.clone());
                RotateOutcome::Rotated
            }
        };
        Ok(outcome)
    }
}

// =============================================================================
// Mock Permission Repository
// =============================================================================

/// Permission store deriving role permissions from an [`InMemoryUserRepository`].
#[derive(Debug)]
pub struct InMemoryPermissionRepository {
    users: Arc<InMemoryUserRepository>,
    overrides: Mutex<HashMap<String, Vec<UserPermissionOverride>>>,

    /// Fail every call.
    fail_all: AtomicBool,
    /// Delay applied to role permission lookups.
    role_lookup_delay: Mutex<Option<Duration>>,

    role_lookup_count: AtomicU64,
    override_lookup_count: AtomicU64,
}

impl InMemoryPermissionRepository {
    /// Creates a repository reading role assignments from `users`.
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            overrides: Mutex::new(HashMap::new()),
            fail_all: AtomicBool::new(false),
            role_lookup_delay: Mutex::new(None),
            role_lookup_count: AtomicU64::new(0),
            override_lookup_count: AtomicU64::new(0),
        }
    }

    /// Adds a per-user override.
    pub fn add_override(&self, o: UserPermissionOverride) {
        self.overrides
            .lock()
            .entry(o.user_id.clone())
            .or_default()
            .push(o);
    }

    /// Makes every call fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Makes role permission lookups wait before answering.
    pub fn delay_role_lookups(&self, delay: Duration) {
        *self.role_lookup_delay.lock() = Some(delay);
    }

    /// Number of role permission lookups, i.e. full resolutions.
    pub fn resolve_count(&self) -> u64 {
        self.role_lookup_count.load(Ordering::SeqCst)
    }

    /// Number of override lookups.
    pub fn override_lookup_count(&self) -> u64 {
        self.override_lookup_count.load(Ordering::SeqCst)
    }

    fn check(&self) -> RepositoryResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn get_role_permissions(&self, user_id: &str) -> RepositoryResult<Vec<Permission>> {
        self.check()?;
        self.role_lookup_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.role_lookup_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .users
            .roles_of(user_id)
            .into_iter()
            .flat_map(|r| r.permissions)
            .collect())
    }

    async fn get_user_overrides(&self, user_id: &str) -> RepositoryResult<Vec<UserPermissionOverride>> {
        self.check()?;
        self.override_lookup_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.overrides.lock().get(user_id).cloned().unwrap_or_default())
    }
}
