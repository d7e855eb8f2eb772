use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use scenebridge_asset::ContentHash;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// A cached backend handle and what it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry<H> {
    pub handle: H,
    /// Key of the material the resource was created with, if any.
    pub material: Option<ContentHash>,
}

impl<H> CacheEntry<H> {
    pub const fn new(handle: H) -> Self {
        Self {
            handle,
            material: None,
        }
    }

    pub const fn with_material(handle: H, material: Option<ContentHash>) -> Self {
        Self { handle, material }
    }
}

/// Key to backend handle store with at most one creation in flight per key.
///
/// Lookups are lock-free per shard. A creation marks its key as pending; other callers
/// asking for the same key wait until the creation finished and then either read the
/// new entry or, if it failed, try to create it themselves. Failed creations are
/// never stored.
///
/// Entries are never evicted by size. They leave the cache through [`ResourceCache::remove`]
/// or [`ResourceCache::drain`] only.
pub struct ResourceCache<K: Eq + Hash + Clone, H: Copy> {
    name: &'static str,
    entries: DashMap<K, CacheEntry<H>>,
    pending: Mutex<HashSet<K>>,
    creation_done: Condvar,
    creations: AtomicU64,
}

impl<K: Eq + Hash + Clone, H: Copy> Debug for ResourceCache<K, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl<K: Eq + Hash + Clone, H: Copy> ResourceCache<K, H> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            pending: Mutex::new(HashSet::new()),
            creation_done: Condvar::new(),
            creations: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<H> {
        self.entries.get(key).map(|e| e.handle)
    }

    #[inline]
    pub fn entry(&self, key: &K) -> Option<CacheEntry<H>> {
        self.entries.get(key).map(|e| *e)
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether a creation for `key` is currently in flight.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of successful creations over the lifetime of this cache.
    pub fn creations(&self) -> u64 {
        self.creations.load(Ordering::Relaxed)
    }

    pub fn get_or_create<E>(&self, key: K, create: impl FnOnce() -> Result<H, E>) -> Result<H, E> {
        self.get_or_create_entry(key, || create().map(CacheEntry::new))
            .map(|e| e.handle)
    }

    /// Returns the cached entry for `key`, creating it with `create` if it doesn't exist.
    ///
    /// `create` runs at most once per call and never concurrently with another
    /// creation of the same key. It must not create the same key in this cache again.
    pub fn get_or_create_entry<E>(
        &self,
        key: K,
        create: impl FnOnce() -> Result<CacheEntry<H>, E>,
    ) -> Result<CacheEntry<H>, E> {
        if let Some(entry) = self.entry(&key) {
            return Ok(entry);
        }

        {
            let mut pending = self.pending.lock();
            loop {
                // a creator inserts its entry before it clears the pending mark
                if let Some(entry) = self.entry(&key) {
                    return Ok(entry);
                }
                if pending.insert(key.clone()) {
                    break;
                }
                self.creation_done.wait(&mut pending);
            }
        }

        let _guard = PendingGuard {
            cache: self,
            key: &key,
        };

        let entry = create()?;
        self.entries.insert(key.clone(), entry);
        self.creations.fetch_add(1, Ordering::Relaxed);

        Ok(entry)
    }

    /// Keys of every entry at the time of the call.
    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn remove(&self, key: &K) -> Option<CacheEntry<H>> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    /// Removes and returns every entry.
    pub fn drain(&self) -> Vec<(K, CacheEntry<H>)> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .collect()
    }
}

struct PendingGuard<'a, K: Eq + Hash + Clone, H: Copy> {
    cache: &'a ResourceCache<K, H>,
    key: &'a K,
}

impl<K: Eq + Hash + Clone, H: Copy> Drop for PendingGuard<'_, K, H> {
    fn drop(&mut self) {
        self.cache.pending.lock().remove(self.key);
        self.cache.creation_done.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn cached_key_does_not_invoke_producer() {
        let cache = ResourceCache::<u32, u64>::new("test");
        assert_eq!(cache.get_or_create(1, || Ok::<_, ()>(10)), Ok(10));
        assert_eq!(
            cache.get_or_create(1, || -> Result<u64, ()> { panic!("created twice") }),
            Ok(10)
        );
        assert_eq!(cache.creations(), 1);
    }

    #[test]
    fn concurrent_callers_create_once() {
        const THREADS: usize = 16;

        let cache = Arc::new(ResourceCache::<u32, u64>::new("race"));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_create(7, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok::<_, ()>(99)
                    })
                })
            })
            .collect();

        for worker in workers {
            assert_eq!(worker.join().unwrap(), Ok(99));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_pending(&7));
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ResourceCache::<u32, u64>::new("fail");
        assert_eq!(cache.get_or_create(3, || Err("rejected")), Err("rejected"));
        assert!(!cache.contains(&3));
        assert!(!cache.is_pending(&3));

        assert_eq!(cache.get_or_create(3, || Ok::<_, &str>(5)), Ok(5));
        assert_eq!(cache.get(&3), Some(5));
    }

    #[test]
    fn key_is_pending_during_creation() {
        let cache = ResourceCache::<u32, u64>::new("pending");
        let handle = cache.get_or_create(4, || {
            assert!(cache.is_pending(&4));
            assert!(!cache.contains(&4));
            Ok::<_, ()>(1)
        });
        assert_eq!(handle, Ok(1));
        assert!(!cache.is_pending(&4));
    }

    #[test]
    fn drain_empties_the_cache() {
        let cache = ResourceCache::<u32, u64>::new("drain");
        for key in 0..5 {
            cache
                .get_or_create_entry(key, || {
                    Ok::<_, ()>(CacheEntry::with_material(key as u64 + 100, None))
                })
                .unwrap();
        }

        let mut drained = cache.drain();
        drained.sort_by_key(|(key, _)| *key);

        assert_eq!(drained.len(), 5);
        assert_eq!(drained[2].1.handle, 102);
        assert!(cache.is_empty());
    }
}
