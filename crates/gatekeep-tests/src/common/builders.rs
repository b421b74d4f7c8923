// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Builders for users and hand-crafted token claims.

use gatekeep_auth::{Claims, PasswordHasher, TokenType};
use gatekeep_core::{Role, User};

use super::fixtures::ConfigFixtures;
use super::mocks::InMemoryUserRepository;

// =============================================================================
// User Builder
// =============================================================================

/// Builder for [`User`] instances with a real password hash.
#[derive(Debug, Clone)]
pub struct UserBuilder {
    id: String,
    username: String,
    email: Option<String>,
    password: String,
    active: bool,
    roles: Vec<Role>,
}

impl UserBuilder {
    /// Create a builder for the given login name.
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: format!("{}-id", username),
            username,
            email: None,
            password: "password".to_string(),
            active: true,
            roles: Vec::new(),
        }
    }

    /// Set the user ID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the email address.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the plain-text password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Mark the user inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Assign a role.
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Build the user.
    pub fn build(&self) -> User {
        let hash = ConfigFixtures::hasher()
            .hash(&self.password)
            .expect("hash test password");
        let email = self
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@example.com", self.username));
        let mut user = User::new(&self.id, &self.username, email, hash);
        user.is_active = self.active;
        user
    }

    /// Build the user and store it with its roles.
    pub fn seed(self, users: &InMemoryUserRepository) -> User {
        let user = self.build();
        users.insert(user.clone());
        for role in self.roles {
            users.assign_role(&user.id, role);
        }
        user
    }
}

// =============================================================================
// Claims Builder
// =============================================================================

/// Builder for hand-crafted [`Claims`], used to forge tokens.
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    claims: Claims,
}

impl ClaimsBuilder {
    /// Access-token claims for a user and session, valid for 15 minutes.
    pub fn access(user_id: &str, session_id: &str) -> Self {
        Self {
            claims: Claims::new(user_id, session_id, TokenType::Access, "gatekeep", 900),
        }
    }

    /// Refresh-token claims for a user and session, valid for one hour.
    pub fn refresh(user_id: &str, session_id: &str) -> Self {
        Self {
            claims: Claims::new(user_id, session_id, TokenType::Refresh, "gatekeep", 3600),
        }
    }

    /// Set the issuer.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.claims.iss = issuer.into();
        self
    }

    /// Move `exp` to `secs_ago` seconds in the past.
    pub fn expired(mut self, secs_ago: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        self.claims.iat = now - secs_ago - 60;
        self.claims.nbf = self.claims.iat;
        self.claims.exp = now - secs_ago;
        self
    }

    /// Move `nbf` to `secs` seconds in the future.
    pub fn not_before_in(mut self, secs: i64) -> Self {
        self.claims.nbf = chrono::Utc::now().timestamp() + secs;
        self
    }

    /// Build the claims.
    pub fn build(self) -> Claims {
        self.claims
    }
}
