//! Time-bounded profile cache keyed by raw token.

use super::profile::Profile;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    profile: Profile,
    stored: Instant,
}

/// Profiles previously fetched for a token, kept for at most `max_age`.
///
/// Stale entries are removed when a lookup finds them; there is no
/// background sweep and no capacity bound.
pub struct ProfileCache {
    max_age: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ProfileCache {
    pub fn new(max_age: Duration) -> Self {
        Self::with_capacity(max_age, 0)
    }

    /// `capacity` only pre-sizes the map.
    pub fn with_capacity(max_age: Duration, capacity: usize) -> Self {
        Self {
            max_age,
            entries: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Cached profile for `raw_token` if it was stored less than `max_age` ago.
    pub fn get(&self, raw_token: &str) -> Option<Profile> {
        let now = Instant::now();
        let mut entries = self.lock();

        let stored = entries.get(raw_token)?.stored;
        if now.duration_since(stored) < self.max_age {
            return entries.get(raw_token).map(|entry| entry.profile.clone());
        }

        entries.remove(raw_token);
        tracing::debug!("evicted stale profile cache entry");
        None
    }

    /// Insert or overwrite the entry for `raw_token`, stamped with the current time.
    pub fn put(&self, raw_token: &str, profile: Profile) {
        let entry = CacheEntry {
            profile,
            stored: Instant::now(),
        };
        self.lock().insert(raw_token.to_string(), entry);
    }

    pub fn remove(&self, raw_token: &str) -> Option<Profile> {
        self.lock().remove(raw_token).map(|entry| entry.profile)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::time::advance;

    fn profile(sub: &str) -> Profile {
        Profile {
            subject: sub.to_string(),
            name: None,
            raw: Bytes::from(format!(r#"{{"sub":"{sub}"}}"#)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get() {
        let cache = ProfileCache::new(Duration::from_millis(100));
        cache.put("tok-x", profile("alice"));
        assert_eq!(cache.get("tok-x"), Some(profile("alice")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss() {
        let cache = ProfileCache::new(Duration::from_millis(100));
        assert_eq!(cache.get("tok-x"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_stale() {
        let cache = ProfileCache::new(Duration::from_millis(100));
        cache.put("tok-x", profile("alice"));

        advance(Duration::from_millis(50)).await;
        assert!(cache.get("tok-x").is_some());

        advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("tok-x"), None);
        assert!(cache.is_empty(), "stale entry should be evicted on read");
        assert_eq!(cache.get("tok-x"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_max_age_is_stale() {
        let cache = ProfileCache::new(Duration::from_millis(100));
        cache.put("tok-x", profile("alice"));

        advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("tok-x"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restamps() {
        let cache = ProfileCache::new(Duration::from_millis(100));
        cache.put("tok-x", profile("alice"));

        advance(Duration::from_millis(80)).await;
        cache.put("tok-x", profile("bob"));

        advance(Duration::from_millis(80)).await;
        assert_eq!(cache.get("tok-x"), Some(profile("bob")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_raw_strings() {
        let cache = ProfileCache::with_capacity(Duration::from_secs(60), 4);
        cache.put("tok-x", profile("alice"));
        assert_eq!(cache.get("tok-x "), None);
        assert_eq!(cache.remove("tok-x"), Some(profile("alice")));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let cache = ProfileCache::new(Duration::from_secs(60));
        cache.put("a", profile("alice"));
        cache.put("b", profile("bob"));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
