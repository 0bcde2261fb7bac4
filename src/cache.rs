//! # Publish-Once Cache
//!
//! Memoizes expensive, deterministic builds (schema plans, compiled path
//! patterns) by string key.
//!
//! ## Thread Safety
//!
//! - Lookups take the read lock only
//! - A miss builds the value with no lock held
//! - Publishing takes the write lock and re-checks the key; when another
//!   thread published first, the fresh build is dropped and the published
//!   entry is returned
//!
//! Every caller for a key therefore converges on one `Arc`. Entries are
//! never mutated or evicted; the cache lives as long as its owner.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// String-keyed, read-mostly map of shared entries.
pub struct PublishCache<V: ?Sized> {
    name: &'static str,
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V: ?Sized> PublishCache<V> {
    /// `name` labels the cache in log events.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached entry for `key`, building and publishing it on a miss.
    pub fn get_or_try_insert<E>(
        &self,
        key: &str,
        build: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, E> {
        // Fast path
        if let Some(hit) = self.get(key) {
            debug!(cache = self.name, key = %key, "Cache hit");
            return Ok(hit);
        }

        let built = build()?;

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(key) {
            debug!(
                cache = self.name,
                key = %key,
                "Entry published by another thread, discarding local build"
            );
            return Ok(Arc::clone(existing));
        }
        entries.insert(key.to_string(), Arc::clone(&built));
        info!(
            cache = self.name,
            key = %key,
            cache_size = entries.len(),
            "Entry built and published"
        );
        Ok(built)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.read().get(key).map(Arc::clone)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: ?Sized> std::fmt::Debug for PublishCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCache")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_builds_once_when_sequential() {
        let cache: PublishCache<String> = PublishCache::new("test");
        let builds = AtomicUsize::new(0);
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert::<()>("k", || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new("v".to_string()))
                })
                .unwrap();
            assert_eq!(*v, "v");
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_is_not_published() {
        let cache: PublishCache<u32> = PublishCache::new("test");
        let err = cache.get_or_try_insert("k", || Err("boom")).unwrap_err();
        assert_eq!(err, "boom");
        assert!(!cache.contains("k"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_builds_converge() {
        let cache = Arc::new(PublishCache::<u64>::new("test"));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_insert::<()>("shared", || Ok(Arc::new(i)))
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let published = cache.get("shared").unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &published)));
        assert_eq!(cache.len(), 1);
    }
}
