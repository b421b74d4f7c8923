// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built users, roles, permissions and configurations.

use std::time::Duration;

use gatekeep_auth::{Argon2Hasher, AuthConfig, PasswordConfig, PasswordHasher, TokenConfig};
use gatekeep_core::{Permission, Role, User};

/// Signing secret used by every fixture configuration.
pub const TEST_SECRET: &str = "gatekeep-test-secret-that-is-long-enough";

// =============================================================================
// Configuration Fixtures
// =============================================================================

/// Pre-built configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Argon2 parameters cheap enough for tests.
    pub fn cheap_password() -> PasswordConfig {
        PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Default configuration with the test secret and cheap hashing.
    pub fn auth() -> AuthConfig {
        AuthConfig::new(TEST_SECRET).with_password(Self::cheap_password())
    }

    /// Configuration with custom token lifetimes.
    pub fn auth_with_ttl(access: Duration, refresh: Duration) -> AuthConfig {
        Self::auth().with_token(
            TokenConfig::new(TEST_SECRET)
                .with_access_ttl(access)
                .with_refresh_ttl(refresh),
        )
    }

    /// A hasher matching [`cheap_password`](Self::cheap_password).
    pub fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(&Self::cheap_password()).expect("valid test password config")
    }
}

// =============================================================================
// Permission Fixtures
// =============================================================================

/// Pre-built permissions and roles.
pub struct PermissionFixtures;

impl PermissionFixtures {
    /// `billing.read`
    pub fn billing_read() -> Permission {
        Permission::from_code("perm-billing-read", "billing.read")
    }

    /// `billing.write`
    pub fn billing_write() -> Permission {
        Permission::from_code("perm-billing-write", "billing.write")
    }

    /// `patient.read`
    pub fn patient_read() -> Permission {
        Permission::from_code("perm-patient-read", "patient.read")
    }

    /// `admin.sessions`
    pub fn admin_sessions() -> Permission {
        Permission::from_code("perm-admin-sessions", "admin.sessions")
    }

    /// Role granting `billing.read` and `billing.write`.
    pub fn billing_clerk() -> Role {
        Role::new("role-billing-clerk", "billing_clerk")
            .with_permission(Self::billing_read())
            .with_permission(Self::billing_write())
    }

    /// Role granting `patient.read` and `billing.read`.
    pub fn viewer() -> Role {
        Role::new("role-viewer", "viewer")
            .with_permission(Self::patient_read())
            .with_permission(Self::billing_read())
    }

    /// Role granting `admin.sessions`.
    pub fn admin() -> Role {
        Role::new("role-admin", "admin").with_permission(Self::admin_sessions())
    }
}

// =============================================================================
// User Fixtures
// =============================================================================

/// Pre-built users. Each constructor hashes its password with cheap parameters.
pub struct UserFixtures;

impl UserFixtures {
    /// Password of [`alice`](Self::alice).
    pub const ALICE_PASSWORD: &'static str = "correct-pw";
    /// Password of [`bob`](Self::bob).
    pub const BOB_PASSWORD: &'static str = "bob-pw";
    /// Password of [`root`](Self::root).
    pub const ROOT_PASSWORD: &'static str = "root-pw";

    /// `alice` / `alice-id`.
    pub fn alice() -> User {
        Self::with_password("alice-id", "alice", Self::ALICE_PASSWORD)
    }

    /// `bob` / `bob-id`.
    pub fn bob() -> User {
        Self::with_password("bob-id", "bob", Self::BOB_PASSWORD)
    }

    /// `root` / `root-id`, intended to hold the admin role.
    pub fn root() -> User {
        Self::with_password("root-id", "root", Self::ROOT_PASSWORD)
    }

    /// A user whose password hash is produced by the cheap test hasher.
    pub fn with_password(id: &str, username: &str, password: &str) -> User {
        let hash = ConfigFixtures::hasher()
            .hash(password)
            .expect("hash test password");
        User::new(id, username, format!("{}@example.com", username), hash)
    }
}
