//! In-memory bean definition registry
//!
//! Maps bean names to definitions, preserving registration order. Shared by
//! concurrent resolution calls; registration is serialized against itself so
//! two threads cannot both claim the same name.

use crate::definition::BeanDefinition;
use crate::{BeanError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

#[cfg(feature = "logging")]
use tracing::debug;

/// Name-keyed store of bean definitions, insertion-ordered and name-unique.
///
/// Registering a duplicate name is an error, not an overwrite. `names()`
/// returns a snapshot: later registry mutation does not retroactively change
/// an already-returned sequence.
pub struct DefinitionRegistry {
    /// Map from bean name to definition
    definitions: DashMap<String, Arc<BeanDefinition>, RandomState>,
    /// Names in registration order; also serializes registration
    ordered_names: Mutex<Vec<String>>,
}

impl DefinitionRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            definitions: DashMap::with_capacity_and_hasher(16, RandomState::new()),
            ordered_names: Mutex::new(Vec::new()),
        }
    }

    /// Register a definition under a unique, non-empty name.
    ///
    /// Fails with [`BeanError::InvalidName`] for an empty name and
    /// [`BeanError::DuplicateDefinition`] if the name is taken; the first
    /// registration remains in effect.
    pub fn register(&self, name: impl Into<String>, definition: BeanDefinition) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(BeanError::InvalidName {
                name,
                reason: "bean name must be non-empty".to_string(),
            });
        }

        // The order lock makes the contains-check + insert atomic under
        // concurrent register calls for the same name.
        let mut names = self.ordered_names.lock().unwrap();
        if self.definitions.contains_key(&name) {
            return Err(BeanError::duplicate(name));
        }
        names.push(name.clone());
        self.definitions.insert(name.clone(), Arc::new(definition));

        #[cfg(feature = "logging")]
        debug!(
            target: "bean_factory",
            bean = %name,
            definition_count = names.len(),
            "Registered bean definition"
        );

        Ok(())
    }

    /// Remove a definition; fails with [`BeanError::NoSuchDefinition`] if absent.
    ///
    /// Administrative path, not hot: the ordered name list is scanned linearly.
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut names = self.ordered_names.lock().unwrap();
        if self.definitions.remove(name).is_none() {
            return Err(BeanError::no_such_definition(name));
        }
        names.retain(|n| n != name);

        #[cfg(feature = "logging")]
        debug!(target: "bean_factory", bean = %name, "Removed bean definition");

        Ok(())
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Result<Arc<BeanDefinition>> {
        self.definitions
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BeanError::no_such_definition(name))
    }

    /// Check whether a name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Snapshot of registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.ordered_names.lock().unwrap().clone()
    }

    /// Number of registered definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("definition_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = DefinitionRegistry::new();
        registry
            .register("db", BeanDefinition::of("Database"))
            .unwrap();

        let def = registry.get("db").unwrap();
        assert_eq!(def.type_name(), Some("Database"));
        assert!(registry.contains("db"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected_first_wins() {
        let registry = DefinitionRegistry::new();
        registry.register("db", BeanDefinition::of("First")).unwrap();

        let err = registry
            .register("db", BeanDefinition::of("Second"))
            .unwrap_err();
        assert!(matches!(err, BeanError::DuplicateDefinition { .. }));
        assert_eq!(registry.get("db").unwrap().type_name(), Some("First"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = DefinitionRegistry::new();
        let err = registry.register("", BeanDefinition::of("X")).unwrap_err();
        assert!(matches!(err, BeanError::InvalidName { .. }));
    }

    #[test]
    fn test_remove() {
        let registry = DefinitionRegistry::new();
        registry.register("a", BeanDefinition::of("A")).unwrap();

        registry.remove("a").unwrap();
        assert!(!registry.contains("a"));
        assert!(matches!(
            registry.get("a").unwrap_err(),
            BeanError::NoSuchDefinition { .. }
        ));

        let err = registry.remove("a").unwrap_err();
        assert!(matches!(err, BeanError::NoSuchDefinition { .. }));
    }

    #[test]
    fn test_names_preserve_registration_order() {
        let registry = DefinitionRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(name, BeanDefinition::of("X")).unwrap();
        }
        assert_eq!(registry.names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_names_are_snapshots() {
        let registry = DefinitionRegistry::new();
        registry.register("a", BeanDefinition::of("A")).unwrap();

        let snapshot = registry.names();
        registry.register("b", BeanDefinition::of("B")).unwrap();

        assert_eq!(snapshot, vec!["a"]);
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_registration_single_winner() {
        use std::thread;

        let registry = Arc::new(DefinitionRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                registry.register("shared", BeanDefinition::of("X")).is_ok()
            }));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
        assert_eq!(registry.len(), 1);
    }
}
