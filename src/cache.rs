//! A concurrent key→value cache with per-entry TTL, hit/miss counters,
//! prune, and clear.
//!
//! Readers take a shared lock to look up and clone what they need, then
//! release it before touching counters or performing lazy deletion — lazy
//! deletion re-acquires the lock exclusively and verifies (by pointer
//! identity) that the entry it saw hasn't already been replaced by a
//! concurrent writer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::manifest::DependencyMap;
use crate::version;

/// `(clone url, ref)` — equality is case-sensitive byte equality, so two
/// keys differing only in case are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub clone_url: String,
    pub git_ref: String,
}

impl CacheKey {
    pub fn new(clone_url: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            clone_url: clone_url.into(),
            git_ref: git_ref.into(),
        }
    }
}

/// An immutable cached dependency set. Entries are replaced wholesale on
/// `set`, never mutated in place, so `Arc::ptr_eq` is a valid "is this still
/// the entry I last saw" check.
#[derive(Debug)]
struct CacheEntry {
    dependencies: DependencyMap,
    cached_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.cached_at) > self.ttl
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    /// Hit rate as a fraction in `[0, 1]`; `0.0` when there have been no
    /// lookups at all.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Concurrent key→value cache, exclusively owned by a `RemoteChecker`.
pub struct TtlCache {
    entries: RwLock<HashMap<CacheKey, Arc<CacheEntry>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            default_ttl,
        }
    }

    /// Looks up the cached version of `module_path` for `(clone_url, git_ref)`.
    ///
    /// Returns `Some(version)` on a hit, `None` on a miss. When
    /// `target_version` is supplied (non-empty), a cached version that
    /// doesn't normalize-equal it is also treated as a miss (and the entry
    /// is lazily evicted).
    pub fn get(
        &self,
        clone_url: &str,
        git_ref: &str,
        module_path: &str,
        target_version: Option<&str>,
    ) -> Option<String> {
        let key = CacheKey::new(clone_url, git_ref);
        let snapshot = {
            let entries = self.entries.read().expect("cache lock poisoned");
            entries.get(&key).cloned()
        };

        let Some(entry) = snapshot else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if entry.is_expired(Instant::now()) {
            self.evict_if_unchanged(&key, &entry);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let Some(cached_version) = entry.dependencies.get(module_path) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if let Some(target_version) = target_version.filter(|v| !v.is_empty()) {
            if version::normalize(cached_version) != version::normalize(target_version) {
                self.evict_if_unchanged(&key, &entry);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(cached_version.clone())
    }

    /// Replaces the entry for `(clone_url, git_ref)` unconditionally.
    pub fn set(&self, clone_url: &str, git_ref: &str, dependencies: DependencyMap) {
        let key = CacheKey::new(clone_url, git_ref);
        let entry = Arc::new(CacheEntry {
            dependencies,
            cached_at: Instant::now(),
            ttl: self.default_ttl,
        });
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(key, entry);
    }

    /// Empties the cache and resets the hit/miss counters to zero.
    pub fn clear(&self) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Removes every expired entry, returning the count removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Current hit/miss counters and cache size.
    pub fn stats(&self) -> CacheStats {
        let size = self.entries.read().expect("cache lock poisoned").len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
        }
    }

    /// Removes `key` only if the entry currently stored is still the exact
    /// allocation `observed` pointed at — a writer may have already replaced
    /// it with a fresh `set`, in which case we must not clobber that.
    fn evict_if_unchanged(&self, key: &CacheKey, observed: &Arc<CacheEntry>) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        if let Some(current) = entries.get(key) {
            if Arc::ptr_eq(current, observed) {
                entries.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn deps(pairs: &[(&str, &str)]) -> DependencyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn set_then_get_is_a_hit() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("https://example.com/a.git", "main", deps(&[("m", "v1.0.0")]));
        assert_eq!(
            cache.get("https://example.com/a.git", "main", "m", None),
            Some("v1.0.0".to_string())
        );
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn unknown_key_is_a_miss() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("https://example.com/a.git", "main", "m", None), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn s7_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(50));
        cache.set("https://example.com/a.git", "main", deps(&[("m", "v1.0.0")]));
        assert!(cache.get("https://example.com/a.git", "main", "m", None).is_some());
        sleep(Duration::from_millis(60));
        assert!(cache.get("https://example.com/a.git", "main", "m", None).is_none());
        assert_eq!(cache.prune(), 0, "lazy get already evicted the entry");
    }

    #[test]
    fn prune_removes_only_expired_entries() {
        let cache = TtlCache::new(Duration::from_millis(50));
        cache.set("https://example.com/a.git", "main", deps(&[("m", "v1.0.0")]));
        sleep(Duration::from_millis(60));
        cache.set("https://example.com/b.git", "main", deps(&[("m", "v1.0.0")]));
        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn target_version_mismatch_is_a_miss() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("https://example.com/a.git", "main", deps(&[("m", "v1.0.0")]));
        assert_eq!(
            cache.get("https://example.com/a.git", "main", "m", Some("v2.0.0")),
            None
        );
    }

    #[test]
    fn clear_resets_counters_and_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("https://example.com/a.git", "main", deps(&[("m", "v1.0.0")]));
        let _ = cache.get("https://example.com/a.git", "main", "m", None);
        cache.clear();
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
    }

    #[test]
    fn case_differing_keys_are_distinct() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("https://example.com/A.git", "main", deps(&[("m", "v1.0.0")]));
        assert!(cache.get("https://example.com/a.git", "main", "m", None).is_none());
    }
}
