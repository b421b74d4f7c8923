// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-scoped permission cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use gatekeep_core::{AuthResult, EffectivePermissions};

type Slot = Arc<OnceCell<Arc<EffectivePermissions>>>;

/// Memoizes effective permissions for the duration of one request.
///
/// One cache is created per inbound request and dropped with it. There is no
/// eviction and no TTL, so a permission change becomes visible on the next
/// request. Not `Clone`; share it by reference.
///
/// Each user gets one slot. Concurrent checks for the same user within a
/// request wait on that slot, so the repositories are consulted at most once.
#[derive(Debug, Default)]
pub struct PermissionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl PermissionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached permissions for a user.
    pub fn get(&self, user_id: &str) -> Option<Arc<EffectivePermissions>> {
        self.slots.lock().get(user_id)?.get().cloned()
    }

    /// Returns the cached permissions for a user, running `resolve` on a miss.
    ///
    /// A failed resolution leaves the slot empty; the next call retries.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        user_id: &str,
        resolve: F,
    ) -> AuthResult<Arc<EffectivePermissions>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AuthResult<EffectivePermissions>>,
    {
        let slot = self.slot(user_id);
        let permissions = slot
            .get_or_try_init(|| async { resolve().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(permissions))
    }

    /// Returns the number of users with resolved permissions.
    pub fn len(&self) -> usize {
        self.slots.lock().values().filter(|s| s.initialized()).count()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, user_id: &str) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(user_id.to_string()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use gatekeep_core::{AuthError, RepositoryError};

    use super::*;

    fn billing_reader() -> EffectivePermissions {
        let mut perms = EffectivePermissions::new();
        perms.set("billing.read", true);
        perms
    }

    #[tokio::test]
    async fn test_get_or_resolve() {
        let cache = PermissionCache::new();
        assert!(cache.get("u1").is_none());

        let perms = cache
            .get_or_resolve("u1", || async { Ok(billing_reader()) })
            .await
            .unwrap();
        assert!(perms.allows("billing.read"));

        let again = cache
            .get_or_resolve("u1", || async { Ok(EffectivePermissions::new()) })
            .await
            .unwrap();
        assert!(again.allows("billing.read"));
        assert!(cache.get("u2").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_resolution_is_not_cached() {
        let cache = PermissionCache::new();

        let result = cache
            .get_or_resolve("u1", || async {
                Err(AuthError::from(RepositoryError::new("down")))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());

        cache
            .get_or_resolve("u1", || async { Ok(billing_reader()) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_resolve_once() {
        let cache = PermissionCache::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let resolve = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(billing_reader())
        };

        let (a, b) = tokio::join!(
            cache.get_or_resolve("u1", resolve),
            cache.get_or_resolve("u1", resolve)
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
