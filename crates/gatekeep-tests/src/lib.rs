// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Gatekeep Integration Tests
//!
//! Integration tests for the authentication core, with the fixtures, mocks
//! and harness they share.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built users, roles and configurations
//!   - `builders`: Builders for users and sessions
//!   - `assertions`: Error-code assertions
//!   - `mocks`: In-memory repositories with failure injection
//!   - `harness`: A seeded, fully wired auth core
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gatekeep-tests
//! cargo test -p gatekeep-tests --test integration_sessions
//! cargo test -p gatekeep-tests -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! ### Token Tests (`integration_tokens.rs`)
//! - Pair generation and type separation
//! - Expiry, issuer and signature checks
//!
//! ### Session Tests (`integration_sessions.rs`)
//! - Login, logout, refresh rotation and replay
//! - Revocation rules and password changes
//! - Request authentication and activity tracking
//!
//! ### Permission Tests (`integration_permissions.rs`)
//! - Role and override precedence
//! - Request-scoped caching
//! - Guard requirements
//!
//! ## Using the Harness
//!
//! ```rust,ignore
//! use gatekeep_tests::prelude::*;
//!
//! #[tokio::test(flavor = "multi_thread")]
//! async fn test_something() {
//!     let h = AuthHarness::new();
//!     let outcome = h.login_alice().await;
//!     let ctx = h
//!         .authenticator
//!         .authenticate(Some(&AuthHarness::bearer(&outcome.tokens.access_token)))
//!         .await
//!         .unwrap();
//!     h.guard.require(&ctx, "billing.read").await.unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::init_test_logging;
    pub use crate::common::mocks::*;
}
