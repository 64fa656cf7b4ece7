//! Two-phase singleton cache
//!
//! Fully-initialized singletons live in the main cache; a separate early
//! phase holds raw instances that exist but have not finished property
//! population. Only property-level consumers inside a circular creation may
//! observe the early phase; presence in the main cache always implies a
//! completely constructed and initialized bean.

use crate::error::BoxedCause;
use crate::types::BeanInstance;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

type DestroyFn = Box<dyn Fn(&BeanInstance) -> Result<(), BoxedCause> + Send + Sync>;

/// A registered teardown callback for one cached singleton.
struct Destroyer {
    name: String,
    instance: BeanInstance,
    invoke: DestroyFn,
}

/// Process-lifetime store of created singleton instances.
///
/// Writes are serialized per name through [`SingletonCache::creation_lock`];
/// reads of populated entries are lock-free.
pub struct SingletonCache {
    /// Fully-initialized instances, append-only except for teardown
    singletons: DashMap<String, BeanInstance, RandomState>,
    /// Raw instances mid-creation, for breaking property-level cycles
    early: DashMap<String, BeanInstance, RandomState>,
    /// Per-name create-once guards
    creation_locks: DashMap<String, Arc<Mutex<()>>, RandomState>,
    /// Teardown callbacks in registration order
    destroyers: Mutex<Vec<Destroyer>>,
}

impl SingletonCache {
    #[inline]
    pub fn new() -> Self {
        Self {
            singletons: DashMap::with_capacity_and_hasher(16, RandomState::new()),
            early: DashMap::with_capacity_and_hasher(4, RandomState::new()),
            creation_locks: DashMap::with_capacity_and_hasher(16, RandomState::new()),
            destroyers: Mutex::new(Vec::new()),
        }
    }

    /// Get a fully-initialized singleton, if created.
    #[inline]
    pub fn get(&self, name: &str) -> Option<BeanInstance> {
        self.singletons.get(name).map(|e| Arc::clone(e.value()))
    }

    /// Get the raw early reference for a singleton mid-creation.
    #[inline]
    pub fn get_early(&self, name: &str) -> Option<BeanInstance> {
        self.early.get(name).map(|e| Arc::clone(e.value()))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.singletons.contains_key(name)
    }

    /// The per-name mutex guarding creation of this singleton.
    ///
    /// Callers hold the returned `Arc` locally and lock it around the whole
    /// create-and-cache sequence, double-checking [`get`](Self::get) after
    /// acquisition.
    pub fn creation_lock(&self, name: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.creation_locks
                .entry(name.to_string())
                .or_default()
                .value(),
        )
    }

    /// Expose a raw instance to property-level consumers during creation.
    pub fn put_early(&self, name: &str, instance: BeanInstance) {
        self.early.insert(name.to_string(), instance);
    }

    /// Drop the early reference without caching (failed creation path).
    pub fn remove_early(&self, name: &str) {
        self.early.remove(name);
    }

    /// Store a fully-initialized singleton, replacing any early reference.
    pub fn put(&self, name: &str, instance: BeanInstance) {
        self.singletons.insert(name.to_string(), instance);
        self.early.remove(name);

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_factory",
            bean = %name,
            singleton_count = self.singletons.len(),
            "Cached singleton instance"
        );
    }

    /// Evict both phases for a name (definition removal path). Any destroyer
    /// already registered for the instance still runs at teardown.
    pub fn remove(&self, name: &str) {
        self.singletons.remove(name);
        self.early.remove(name);
    }

    /// Register a teardown callback, run in reverse registration order by
    /// [`destroy_singletons`](Self::destroy_singletons).
    pub fn register_destroyer<F>(&self, name: &str, instance: BeanInstance, invoke: F)
    where
        F: Fn(&BeanInstance) -> Result<(), BoxedCause> + Send + Sync + 'static,
    {
        self.destroyers.lock().unwrap().push(Destroyer {
            name: name.to_string(),
            instance,
            invoke: Box::new(invoke),
        });
    }

    /// Names of created singletons, unordered.
    pub fn names(&self) -> Vec<String> {
        self.singletons.iter().map(|e| e.key().clone()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.singletons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.singletons.is_empty()
    }

    /// Tear down all cached singletons.
    ///
    /// Destroy callbacks run in reverse registration order (dependents before
    /// their dependencies); failures are logged and skipped so one broken
    /// destroy method cannot block the rest. All phases are cleared.
    pub fn destroy_singletons(&self) {
        let mut destroyers = self.destroyers.lock().unwrap();
        for destroyer in destroyers.drain(..).rev() {
            if let Err(_cause) = (destroyer.invoke)(&destroyer.instance) {
                #[cfg(feature = "logging")]
                warn!(
                    target: "bean_factory",
                    bean = %destroyer.name,
                    error = %_cause,
                    "Destroy method failed during container teardown"
                );
            }
            // Quiet the unused warning when logging is disabled
            let _ = &destroyer.name;
        }
        drop(destroyers);

        self.singletons.clear();
        self.early.clear();
        self.creation_locks.clear();

        #[cfg(feature = "logging")]
        debug!(target: "bean_factory", "Singleton cache cleared");
    }
}

impl Default for SingletonCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonCache")
            .field("singleton_count", &self.len())
            .field("early_count", &self.early.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{downcast_instance, instance_of};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Widget {
        id: u32,
    }

    #[test]
    fn test_put_and_get() {
        let cache = SingletonCache::new();
        assert!(cache.get("w").is_none());

        cache.put("w", instance_of(Widget { id: 1 }));
        let hit = cache.get("w").unwrap();
        assert_eq!(downcast_instance::<Widget>(&hit).unwrap().id, 1);
        assert!(cache.contains("w"));
    }

    #[test]
    fn test_put_clears_early_phase() {
        let cache = SingletonCache::new();
        cache.put_early("w", instance_of(Widget { id: 1 }));
        assert!(cache.get_early("w").is_some());
        assert!(cache.get("w").is_none());

        cache.put("w", instance_of(Widget { id: 1 }));
        assert!(cache.get_early("w").is_none());
        assert!(cache.get("w").is_some());
    }

    #[test]
    fn test_remove_early_on_failed_creation() {
        let cache = SingletonCache::new();
        cache.put_early("w", instance_of(Widget { id: 1 }));
        cache.remove_early("w");
        assert!(cache.get_early("w").is_none());
        assert!(!cache.contains("w"));
    }

    #[test]
    fn test_creation_lock_is_stable_per_name() {
        let cache = SingletonCache::new();
        let a = cache.creation_lock("w");
        let b = cache.creation_lock("w");
        assert!(Arc::ptr_eq(&a, &b));

        let other = cache.creation_lock("x");
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_destroyers_run_in_reverse_order() {
        static ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        let cache = SingletonCache::new();
        cache.put("first", instance_of(Widget { id: 1 }));
        cache.register_destroyer("first", cache.get("first").unwrap(), |_| {
            ORDER.lock().unwrap().push("first");
            Ok(())
        });
        cache.put("second", instance_of(Widget { id: 2 }));
        cache.register_destroyer("second", cache.get("second").unwrap(), |_| {
            ORDER.lock().unwrap().push("second");
            Ok(())
        });

        cache.destroy_singletons();
        assert_eq!(*ORDER.lock().unwrap(), vec!["second", "first"]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_destroyer_does_not_block_others() {
        static RAN: AtomicU32 = AtomicU32::new(0);

        let cache = SingletonCache::new();
        cache.put("bad", instance_of(Widget { id: 1 }));
        cache.register_destroyer("bad", cache.get("bad").unwrap(), |_| {
            Err("teardown exploded".into())
        });
        cache.put("good", instance_of(Widget { id: 2 }));
        cache.register_destroyer("good", cache.get("good").unwrap(), |_| {
            RAN.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        cache.destroy_singletons();
        assert_eq!(RAN.load(Ordering::SeqCst), 1);
    }
}
