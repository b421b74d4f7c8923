// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatekeep-auth
//!
//! Authentication and authorization core.
//!
//! ## Components
//!
//! - [`TokenManager`]: issues and validates HS256 access/refresh pairs
//! - [`SessionManager`]: login, logout, refresh rotation, revocation
//! - [`PermissionResolver`]: role permissions combined with per-user overrides
//! - [`PermissionCache`]: request-scoped memoization for the resolver
//! - [`Authenticator`] / [`PermissionGuard`]: request-side checks
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gatekeep_auth::{AuthConfig, Authenticator, LoginRequest, SessionManager};
//!
//! let config = AuthConfig::from_env()?;
//! let sessions = SessionManager::builder(config.clone())
//!     .users(users)
//!     .sessions(session_repo)
//!     .permissions(permission_repo)
//!     .build()?;
//!
//! let outcome = sessions.login(LoginRequest::new("alice", "correct-pw")).await?;
//!
//! let auth = Authenticator::new(sessions.clone(), &config.activity);
//! let header = format!("Bearer {}", outcome.tokens.access_token);
//! let ctx = auth.authenticate(Some(&header)).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod guard;
pub mod password;
pub mod permission;
pub mod session;
pub mod token;

pub use config::{ActivityConfig, AuthConfig, PasswordConfig, TokenConfig, MAX_TOKEN_TTL};
pub use guard::{extract_bearer_token, Authenticator, PermissionGuard, RequestContext};
pub use password::{Argon2Hasher, PasswordHasher};
pub use permission::{compute_effective_permissions, PermissionCache, PermissionResolver};
pub use session::{
    ActivityTracker, LoginOutcome, LoginRequest, SessionManager, SessionManagerBuilder,
    UserSummary,
};
pub use token::{hash_token, Claims, TokenManager, TokenPair, TokenType};

pub use gatekeep_core::{AuthError, AuthResult};
