// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! Wires the auth core to in-memory repositories.

use std::sync::Arc;

use gatekeep_auth::{
    AuthConfig, AuthResult, Authenticator, LoginOutcome, LoginRequest, PermissionGuard,
    SessionManager,
};
use gatekeep_core::audit::InMemoryAuditLogger;

use super::fixtures::{ConfigFixtures, PermissionFixtures, UserFixtures};
use super::mocks::{InMemoryPermissionRepository, InMemorySessionRepository, InMemoryUserRepository};

// =============================================================================
// AuthHarness
// =============================================================================

/// A fully wired auth core over in-memory repositories.
///
/// Seeded with `alice` (billing clerk), `bob` (viewer) and `root` (admin).
pub struct AuthHarness {
    /// Configuration the managers were built with.
    pub config: AuthConfig,
    /// User repository.
    pub users: Arc<InMemoryUserRepository>,
    /// Session repository.
    pub sessions: Arc<InMemorySessionRepository>,
    /// Permission repository.
    pub permissions: Arc<InMemoryPermissionRepository>,
    /// Audit sink.
    pub audit: InMemoryAuditLogger,
    /// Session manager under test.
    pub manager: SessionManager,
    /// Request authenticator.
    pub authenticator: Authenticator,
    /// Permission guard.
    pub guard: PermissionGuard,
}

impl AuthHarness {
    /// Builds a seeded harness with the default test configuration.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(ConfigFixtures::auth())
    }

    /// Builds a seeded harness with a custom configuration.
    pub fn with_config(config: AuthConfig) -> Self {
        super::init_test_logging();

        let users = Arc::new(InMemoryUserRepository::new());
        users.insert(UserFixtures::alice());
        users.insert(UserFixtures::bob());
        users.insert(UserFixtures::root());
        users.assign_role("alice-id", PermissionFixtures::billing_clerk());
        users.assign_role("bob-id", PermissionFixtures::viewer());
        users.assign_role("root-id", PermissionFixtures::admin());

        let sessions = Arc::new(InMemorySessionRepository::new());
        let permissions = Arc::new(InMemoryPermissionRepository::new(Arc::clone(&users)));
        let audit = InMemoryAuditLogger::new();

        let manager = SessionManager::builder(config.clone())
            .users(users.clone())
            .sessions(sessions.clone())
            .permissions(permissions.clone())
            .audit(Arc::new(audit.clone()))
            .build()
            .expect("valid harness configuration");

        let authenticator = Authenticator::new(manager.clone(), &config.activity);
        let guard = PermissionGuard::new(manager.resolver().clone());

        Self {
            config,
            users,
            sessions,
            permissions,
            audit,
            manager,
            authenticator,
            guard,
        }
    }

    /// Logs alice in with the correct password.
    pub async fn login_alice(&self) -> LoginOutcome {
        self.login("alice", UserFixtures::ALICE_PASSWORD)
            .await
            .expect("alice login")
    }

    /// Logs a user in without client metadata.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        self.manager
            .login(LoginRequest::new(username, password))
            .await
    }

    /// Formats an `Authorization` header for an access token.
    pub fn bearer(access_token: &str) -> String {
        format!("Bearer {}", access_token)
    }
}

impl Default for AuthHarness {
    fn default() -> Self {
        Self::new()
    }
}
