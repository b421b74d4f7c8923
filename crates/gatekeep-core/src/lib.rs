// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatekeep-core
//!
//! Foundation types shared by the gatekeep auth crates.
//!
//! ## Modules
//!
//! - [`error`]: `AuthError`, `RepositoryError`, `ConfigError`
//! - [`entity`]: users, roles, permissions, overrides, sessions
//! - [`repository`]: async persistence contracts
//! - [`audit`]: audit event types and loggers

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod audit;
pub mod entity;
pub mod error;
pub mod repository;

pub use entity::{
    EffectivePermissions, LoginSession, OverrideType, Permission, Role, User,
    UserPermissionOverride, UserWithPermissions,
};
pub use error::{AuthError, AuthResult, ConfigError, RepositoryError};
pub use repository::{
    PermissionRepository, RepositoryResult, RotateOutcome, SessionRepository, UserRepository,
};
