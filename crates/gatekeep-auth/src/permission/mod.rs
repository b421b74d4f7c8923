// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission resolution and request-scoped caching.
//!
//! Effective permissions follow a strict precedence: revoke overrides beat
//! grant overrides, which beat role-derived permissions.

mod cache;
mod resolver;

pub use cache::PermissionCache;
pub use resolver::{compute_effective_permissions, PermissionResolver};
