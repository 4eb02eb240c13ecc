//! Load cache: at most one initialization per binding per cache.
//!
//! Keyed by `(group, name, owner_package)`. Each key has its own slot, so two
//! threads loading the same binding serialize on that slot while loads of other
//! bindings proceed. Only successful loads are stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use plugboard_core::{CacheKey, LoadError, LoadedValue};
use tracing::debug;

type Slot = Arc<Mutex<Option<LoadedValue>>>;

#[derive(Default)]
pub struct LoadCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `load` and remember its result.
    pub fn get_or_load<F>(&self, key: &CacheKey, load: F) -> Result<LoadedValue, LoadError>
    where
        F: FnOnce() -> Result<LoadedValue, LoadError>,
    {
        let slot = Arc::clone(lock(&self.slots).entry(key.clone()).or_default());
        let mut cached = lock(&slot);
        if let Some(value) = cached.as_ref() {
            debug!(
                group = %key.group,
                name = %key.name,
                package = %key.owner_package,
                "[Cache] Hit"
            );
            return Ok(value.clone());
        }
        let value = load()?;
        *cached = Some(value.clone());
        Ok(value)
    }

    pub fn get(&self, key: &CacheKey) -> Option<LoadedValue> {
        let slot = lock(&self.slots).get(key).cloned()?;
        let cached = lock(&slot);
        cached.clone()
    }

    /// Number of successfully loaded entries.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every entry. The next load of each binding runs its factory again.
    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn key(name: &str) -> CacheKey {
        CacheKey {
            group: "foo".into(),
            name: name.into(),
            owner_package: "foo".into(),
        }
    }

    #[test]
    fn second_load_hits_cache() {
        let cache = LoadCache::new();
        let calls = AtomicUsize::new(0);
        let load = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(LoadedValue::new(5u8))
        };
        let first = cache.get_or_load(&key("Base"), load).unwrap();
        let second = cache.get_or_load(&key("Base"), load).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = LoadCache::new();
        let err = cache
            .get_or_load(&key("Base"), || Err(LoadError::NamespaceNotFound("foo".into())))
            .unwrap_err();
        assert!(matches!(err, LoadError::NamespaceNotFound(_)));
        assert!(cache.is_empty());
        assert!(cache.get(&key("Base")).is_none());

        cache
            .get_or_load(&key("Base"), || Ok(LoadedValue::new(1u8)))
            .unwrap();
        assert!(cache.get(&key("Base")).is_some());
    }

    #[test]
    fn concurrent_loads_initialize_once() {
        let cache = Arc::new(LoadCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache
                        .get_or_load(&key("Base"), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(LoadedValue::new(String::from("slow")))
                        })
                        .unwrap()
                })
            })
            .collect();
        let values: Vec<LoadedValue> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| w[0].ptr_eq(&w[1])));
    }

    #[test]
    fn clear_forgets_entries() {
        let cache = LoadCache::new();
        cache.get_or_load(&key("A"), || Ok(LoadedValue::new(1u8))).unwrap();
        cache.get_or_load(&key("B"), || Ok(LoadedValue::new(2u8))).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
