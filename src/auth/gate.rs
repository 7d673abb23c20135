use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Role;

#[derive(Debug, Clone)]
struct CachedRole {
    role: Role,
    fetched_at: Instant,
}

/// Answers whether the API is currently writable.
///
/// The role is read from the single `permisos` row and trusted for `ttl`
/// before the next lookup. A missing row is never cached.
pub struct PermissionGate {
    ttl: Duration,
    cached: Mutex<Option<CachedRole>>,
}

impl PermissionGate {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cached: Mutex::new(None),
        }
    }

    fn cached(&self) -> std::sync::MutexGuard<'_, Option<CachedRole>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current role, or `Error::PermissionsNotConfigured` when the
    /// row is absent.
    pub fn current_role(&self, store: &dyn Store) -> Result<Role> {
        self.current_role_at(store, Instant::now())
    }

    pub fn current_role_at(&self, store: &dyn Store, now: Instant) -> Result<Role> {
        if let Some(entry) = self.cached().as_ref() {
            if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                return Ok(entry.role.clone());
            }
        }

        let role = store.get_role()?.ok_or(Error::PermissionsNotConfigured)?;
        tracing::debug!(%role, "Refreshed permission role");

        *self.cached() = Some(CachedRole {
            role: role.clone(),
            fetched_at: now,
        });

        Ok(role)
    }

    /// Forgets the cached role so the next check hits the database.
    pub fn invalidate(&self) {
        *self.cached() = None;
    }
}
