// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Effective permission resolution.

use std::sync::Arc;

use gatekeep_core::{
    AuthError, AuthResult, EffectivePermissions, OverrideType, Permission, PermissionRepository,
    UserPermissionOverride, UserRepository, UserWithPermissions,
};

use super::cache::PermissionCache;

// =============================================================================
// Pure resolution
// =============================================================================

/// Combines role permissions with per-user overrides.
///
/// Role permissions are applied first, then grants, then revokes. A revoke
/// always wins, so the order of `overrides` does not matter.
pub fn compute_effective_permissions(
    role_permissions: &[Permission],
    overrides: &[UserPermissionOverride],
) -> EffectivePermissions {
    let mut effective = EffectivePermissions::new();

    for permission in role_permissions {
        effective.set(permission.code.clone(), true);
    }

    for o in overrides.iter().filter(|o| o.override_type == OverrideType::Grant) {
        effective.set(o.permission.code.clone(), true);
    }

    for o in overrides.iter().filter(|o| o.override_type == OverrideType::Revoke) {
        effective.set(o.permission.code.clone(), false);
    }

    effective
}

// =============================================================================
// PermissionResolver
// =============================================================================

/// Resolves effective permissions through a request-scoped cache.
#[derive(Clone)]
pub struct PermissionResolver {
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl PermissionResolver {
    /// Creates a resolver over the given repositories.
    pub fn new(users: Arc<dyn UserRepository>, permissions: Arc<dyn PermissionRepository>) -> Self {
        Self { users, permissions }
    }

    /// Resolves a user's effective permissions from the repositories, uncached.
    pub async fn resolve_effective_permissions(
        &self,
        user_id: &str,
    ) -> AuthResult<EffectivePermissions> {
        let role_permissions = self.permissions.get_role_permissions(user_id).await?;
        let overrides = self.permissions.get_user_overrides(user_id).await?;

        let effective = compute_effective_permissions(&role_permissions, &overrides);
        tracing::debug!(
            user_id = %user_id,
            roles = role_permissions.len(),
            overrides = overrides.len(),
            entries = effective.len(),
            "Resolved effective permissions"
        );
        Ok(effective)
    }

    /// Returns a user's effective permissions, resolving on cache miss.
    pub async fn resolve_user_permissions(
        &self,
        cache: &PermissionCache,
        user_id: &str,
    ) -> AuthResult<Arc<EffectivePermissions>> {
        cache
            .get_or_resolve(user_id, || self.resolve_effective_permissions(user_id))
            .await
    }

    /// Returns `true` if the user holds `code`.
    pub async fn has_permission(
        &self,
        cache: &PermissionCache,
        user_id: &str,
        code: &str,
    ) -> AuthResult<bool> {
        let permissions = self.resolve_user_permissions(cache, user_id).await?;
        Ok(permissions.allows(code))
    }

    /// Returns `true` if the user holds at least one of `codes`.
    ///
    /// An empty list yields `false`.
    pub async fn has_any_permission(
        &self,
        cache: &PermissionCache,
        user_id: &str,
        codes: &[&str],
    ) -> AuthResult<bool> {
        let permissions = self.resolve_user_permissions(cache, user_id).await?;
        Ok(codes.iter().any(|code| permissions.allows(code)))
    }

    /// Returns `true` if the user holds every one of `codes`.
    ///
    /// An empty list yields `true`.
    pub async fn has_all_permissions(
        &self,
        cache: &PermissionCache,
        user_id: &str,
        codes: &[&str],
    ) -> AuthResult<bool> {
        let permissions = self.resolve_user_permissions(cache, user_id).await?;
        Ok(codes.iter().all(|code| permissions.allows(code)))
    }

    /// Loads a user together with roles and effective permissions.
    ///
    /// A role lookup failure degrades to an empty role list; a permission
    /// lookup failure is returned.
    pub async fn get_user_with_permissions(
        &self,
        cache: &PermissionCache,
        user_id: &str,
    ) -> AuthResult<UserWithPermissions> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let roles = match self.users.get_roles_by_user_id(user_id).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to load roles");
                Vec::new()
            }
        };

        let permissions = self.resolve_user_permissions(cache, user_id).await?;

        Ok(UserWithPermissions {
            user,
            roles,
            permissions: (*permissions).clone(),
        })
    }
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
