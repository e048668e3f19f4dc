use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Session-scoped memo table that runs at most one computation per key.
///
/// Each key maps to a shared [`OnceCell`]. The first caller for a key runs the
/// initializer while concurrent callers for the same key block on the cell and
/// then observe the same value. An initializer that returns `Err` leaves the
/// cell empty, so the next caller retries instead of seeing a cached error.
/// Entries are never evicted; the table lives as long as its session.
pub struct InFlightCache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
    computations: AtomicUsize,
}

impl<K, V> Default for InFlightCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        }
    }
}

impl<K, V> InFlightCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `init` on a miss
    pub fn get_or_try_insert_with<E, F>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let cell = self.cell_for(key);
        cell.get_or_try_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            init()
        })
        .cloned()
    }

    /// Completed value for `key`, without computing anything
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of times an initializer has been started
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop completed values. Cells still being computed are kept so their
    /// waiters and later requesters keep sharing one computation.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, cell| cell.get().is_none());
    }

    fn cell_for(&self, key: K) -> Arc<OnceCell<V>> {
        // The lock only guards the table; computations run outside it
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_cache_basic_operations() {
        let cache: InFlightCache<String, u32> = InFlightCache::new();

        let first: Result<u32, ()> = cache.get_or_try_insert_with("a".to_string(), || Ok(1));
        let second: Result<u32, ()> = cache.get_or_try_insert_with("a".to_string(), || Ok(2));

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.computations(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: InFlightCache<u8, &'static str> = InFlightCache::new();

        let failed = cache.get_or_try_insert_with(1, || Err("interrupted"));
        assert_eq!(failed, Err("interrupted"));
        assert_eq!(cache.get(&1), None);

        let retried: Result<_, &str> = cache.get_or_try_insert_with(1, || Ok("done"));
        assert_eq!(retried, Ok("done"));
        assert_eq!(cache.computations(), 2);
    }

    #[test]
    fn test_concurrent_requests_share_one_computation() {
        let cache: InFlightCache<&'static str, usize> = InFlightCache::new();
        let barrier = Barrier::new(8);

        let results: Vec<usize> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_try_insert_with("key", || {
                                thread::sleep(Duration::from_millis(50));
                                Ok::<_, ()>(42)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|&value| value == 42));
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn test_completed_values_are_never_recomputed() {
        let cache: InFlightCache<u16, u16> = InFlightCache::new();
        for round in 0..3 {
            for key in 0..1000u16 {
                let value: Result<u16, ()> = cache.get_or_try_insert_with(key, || Ok(key + round));
                assert_eq!(value, Ok(key));
            }
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.computations(), 1000);
    }

    #[test]
    fn test_other_keys_do_not_disturb_an_in_flight_computation() {
        let cache: InFlightCache<&'static str, u32> = InFlightCache::new();
        let started = Barrier::new(2);

        thread::scope(|scope| {
            let slow = scope.spawn(|| {
                cache.get_or_try_insert_with("a", || {
                    started.wait();
                    thread::sleep(Duration::from_millis(200));
                    Ok::<_, ()>(1)
                })
            });

            started.wait();
            let other: Result<u32, ()> = cache.get_or_try_insert_with("b", || Ok(2));
            assert_eq!(other, Ok(2));
            // Joins the computation started by the first thread
            let joined: Result<u32, ()> = cache.get_or_try_insert_with("a", || Ok(99));
            assert_eq!(joined, Ok(1));
            assert_eq!(slow.join().unwrap(), Ok(1));
        });

        assert_eq!(cache.computations(), 2);
    }

    #[test]
    fn test_clear_keeps_in_flight_cells() {
        let cache: InFlightCache<&'static str, u32> = InFlightCache::new();
        let started = Barrier::new(2);

        thread::scope(|scope| {
            let slow = scope.spawn(|| {
                cache.get_or_try_insert_with("a", || {
                    started.wait();
                    thread::sleep(Duration::from_millis(100));
                    Ok::<_, ()>(1)
                })
            });

            started.wait();
            let _: Result<u32, ()> = cache.get_or_try_insert_with("b", || Ok(2));
            cache.clear();
            let joined: Result<u32, ()> = cache.get_or_try_insert_with("a", || Ok(99));
            assert_eq!(joined, Ok(1));
            assert_eq!(slow.join().unwrap(), Ok(1));
        });

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.computations(), 2);
    }
}
