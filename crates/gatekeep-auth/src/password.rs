// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing.
//!
//! Hashing is CPU bound; async callers run it on the blocking pool (see
//! [`SessionManager`](crate::session::SessionManager)).

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version, ARGON2ID_IDENT};

use gatekeep_core::{AuthError, AuthResult, ConfigError};

use crate::config::PasswordConfig;

// =============================================================================
// PasswordHasher
// =============================================================================

/// Hashes and verifies passwords.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a password into a self-describing encoded string.
    fn hash(&self, password: &str) -> AuthResult<String>;

    /// Verifies a password against an encoded hash.
    ///
    /// Returns `Ok(false)` on mismatch. Errors are reserved for backend failures.
    fn verify(&self, password: &str, hash: &str) -> AuthResult<bool>;

    /// Returns `true` if the hash was produced with weaker or different
    /// parameters than the current configuration.
    fn needs_rehash(&self, _hash: &str) -> bool {
        false
    }

    /// Spends the cost of one verification without a stored hash.
    ///
    /// Called for unknown usernames so both failure paths take equal time.
    fn verify_dummy(&self, _password: &str) {}
}

// =============================================================================
// Argon2Hasher
// =============================================================================

/// Argon2id password hasher.
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    params: Params,
    dummy_hash: OnceLock<Option<String>>,
}

impl Argon2Hasher {
    /// Creates a hasher with the configured cost parameters.
    pub fn new(config: &PasswordConfig) -> AuthResult<Self> {
        config.validate()?;

        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ConfigError::invalid("password", e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            params,
            dummy_hash: OnceLock::new(),
        })
    }

    /// Returns the configured parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::password_hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return Ok(false);
            }
        };

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::password_hashing(e.to_string())),
        }
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm != ARGON2ID_IDENT {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() < self.params.m_cost()
                    || stored.t_cost() < self.params.t_cost()
                    || stored.p_cost() < self.params.p_cost()
            }
            Err(_) => true,
        }
    }

    fn verify_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| self.hash("gatekeep-dummy-password").ok());
        if let Some(hash) = dummy {
            let _ = self.verify(password, hash);
        }
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
