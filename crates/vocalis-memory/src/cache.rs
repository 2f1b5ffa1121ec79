// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-bounded cache with lazy eviction and prefix invalidation.
//!
//! Entries expire `ttl` after insertion. Expired entries are removed when a
//! lookup touches them, by [`TtlCache::purge_expired`], or when a prefix
//! invalidation sweeps them. All state sits behind one mutex that is never
//! held across an await point.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use vocalis_core::TenantScope;

const KEY_SEPARATOR: char = '\u{1f}';

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A keyed cache whose entries become invisible once their TTL elapses.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a live value, evicting the entry if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry and its expiry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let expires_at = Instant::now() + self.ttl;
        self.lock()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Removes every entry whose key starts with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Drops all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prefix shared by every cache key belonging to `scope`.
///
/// The separator cannot appear in ordinary ids, so one tenant's prefix never
/// matches another's (`alice` vs `alice2`).
pub fn scope_prefix(scope: &TenantScope) -> String {
    format!(
        "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}",
        scope.avatar_id, scope.user_id
    )
}

/// Composite key of scope and query text.
pub fn retrieval_key(scope: &TenantScope, query_text: &str) -> String {
    let mut key = scope_prefix(scope);
    key.push_str(query_text);
    key
}
