use dashmap::DashMap;
use std::sync::Arc;

use crate::common::LockRegistry;
use crate::errors::OdmResult;
use crate::mapping::ArangoSearchPropertiesOptions;
use crate::view::{AggregatedViewConfig, ViewConflictPolicy, ViewRegistryEntry};

/// Merges the search view contributions of entity types, per view name.
///
/// Registrations against the same view name are serialized; registrations
/// against different views run in parallel. A contribution is validated
/// against the current state before anything is changed, so a rejected
/// registration leaves the view as it was.
///
/// Cloning is cheap; clones share the same registrations.
#[derive(Clone)]
pub struct ViewRegistry {
    inner: Arc<ViewRegistryInner>,
}

struct ViewRegistryInner {
    entries: DashMap<String, ViewRegistryEntry>,
    locks: LockRegistry,
    policy: ViewConflictPolicy,
}

impl ViewRegistry {
    pub fn new(policy: ViewConflictPolicy) -> Self {
        ViewRegistry {
            inner: Arc::new(ViewRegistryInner {
                entries: DashMap::new(),
                locks: LockRegistry::new(),
                policy,
            }),
        }
    }

    pub fn policy(&self) -> ViewConflictPolicy {
        self.inner.policy
    }

    /// Registers the contribution of `type_name` to `view_name` and returns
    /// the merged view configuration.
    ///
    /// `contribution` carries the view-level settings the type declares and
    /// at most one link, to the type's backing collection. Registering the
    /// same type again does not duplicate its link.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when the contribution sets a view-level
    /// option to a different value than an earlier contribution and the
    /// policy is [`ViewConflictPolicy::Reject`].
    pub fn register(
        &self,
        view_name: &str,
        type_name: &str,
        contribution: &ArangoSearchPropertiesOptions,
    ) -> OdmResult<AggregatedViewConfig> {
        let handle = self.inner.locks.get_lock(view_name);
        let _guard = handle.lock();

        let current = self
            .inner
            .entries
            .get(view_name)
            .map(|entry| entry.clone())
            .unwrap_or_else(|| ViewRegistryEntry::new(view_name));
        let merged = current.merged(type_name, contribution, self.inner.policy)?;

        log::debug!(
            "Registered {} with view {}: {} link(s), contributors {:?}",
            type_name,
            view_name,
            merged.config().links().len(),
            merged.contributing_types()
        );
        let config = merged.config();
        self.inner.entries.insert(view_name.to_string(), merged);
        Ok(config)
    }

    /// Returns the merged configuration of `view_name` as registered so far.
    pub fn properties(&self, view_name: &str) -> Option<AggregatedViewConfig> {
        self.inner.entries.get(view_name).map(|entry| entry.config())
    }

    pub fn contains(&self, view_name: &str) -> bool {
        self.inner.entries.contains_key(view_name)
    }

    pub fn contributing_types(&self, view_name: &str) -> Vec<String> {
        self.inner
            .entries
            .get(view_name)
            .map(|entry| entry.contributing_types().to_vec())
            .unwrap_or_default()
    }

    /// Forgets every registration of `view_name`.
    ///
    /// The named lock of the view is kept, so a registration waiting on it
    /// still excludes every later one.
    ///
    /// Returns `true` if the view was registered.
    pub fn remove(&self, view_name: &str) -> bool {
        let handle = self.inner.locks.get_lock(view_name);
        let _guard = handle.lock();
        let removed = self.inner.entries.remove(view_name).is_some();
        if removed {
            log::debug!("Removed registrations of view {}", view_name);
        }
        removed
    }

    /// Removes the links to `collection` from every registered view and
    /// returns the names of the views that linked it.
    ///
    /// Contributing types stay registered; setting up the collection again
    /// contributes their links anew.
    pub fn forget_collection(&self, collection: &str) -> Vec<String> {
        let mut affected = vec![];
        for view_name in self.view_names() {
            let handle = self.inner.locks.get_lock(&view_name);
            let _guard = handle.lock();
            if let Some(mut entry) = self.inner.entries.get_mut(&view_name) {
                if entry.remove_link(collection) {
                    affected.push(view_name.clone());
                }
            }
        }
        if !affected.is_empty() {
            log::debug!("Removed links to collection {} from views {:?}", collection, affected);
        }
        affected
    }

    /// Names of all registered views, sorted.
    pub fn view_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new(ViewConflictPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mapping::{CollectionLink, FieldLink};
    use std::thread;
    use std::time::Duration;

    fn contribution(collection: &str) -> ArangoSearchPropertiesOptions {
        ArangoSearchPropertiesOptions::new()
            .cleanup_interval_step(15)
            .link(CollectionLink::on(collection).field(FieldLink::on("value")))
    }

    #[test]
    fn test_register_and_query() {
        let registry = ViewRegistry::default();
        registry.register("commonView", "A", &contribution("a")).unwrap();
        let config = registry.register("commonView", "B", &contribution("b")).unwrap();

        assert_eq!(config.links().len(), 2);
        assert_eq!(registry.properties("commonView"), Some(config));
        assert!(registry.contains("commonView"));
        assert_eq!(registry.contributing_types("commonView"), vec!["A", "B"]);
        assert_eq!(registry.view_names(), vec!["commonView"]);
        assert!(registry.properties("other").is_none());
    }

    #[test]
    fn test_rejected_registration_leaves_entry_untouched() {
        let registry = ViewRegistry::default();
        registry.register("v", "A", &contribution("a")).unwrap();
        let before = registry.properties("v");

        let conflicting = contribution("b").cleanup_interval_step(30);
        let err = registry.register("v", "B", &conflicting).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert_eq!(registry.properties("v"), before);
    }

    #[test]
    fn test_remove_starts_clean() {
        let registry = ViewRegistry::default();
        registry.register("v", "A", &contribution("a")).unwrap();
        assert!(registry.remove("v"));
        assert!(!registry.remove("v"));
        assert!(!registry.contains("v"));

        let config = registry
            .register("v", "B", &contribution("b").cleanup_interval_step(30))
            .unwrap();
        assert_eq!(config.contributing_types(), &["B".to_string()]);
    }

    #[test]
    fn test_forget_collection_drops_only_its_links() {
        let registry = ViewRegistry::default();
        registry.register("v", "A", &contribution("a")).unwrap();
        registry.register("v", "B", &contribution("b")).unwrap();
        registry.register("w", "C", &contribution("c")).unwrap();

        assert_eq!(registry.forget_collection("b"), vec!["v"]);
        let config = registry.properties("v").unwrap();
        assert_eq!(config.links().len(), 1);
        assert_eq!(config.links()[0].name, "a");
        assert_eq!(config.contributing_types(), &["A".to_string(), "B".to_string()]);
        assert_eq!(registry.properties("w").unwrap().links().len(), 1);
        assert!(registry.forget_collection("b").is_empty());

        let config = registry.register("v", "B", &contribution("b")).unwrap();
        assert_eq!(config.links().len(), 2);
        assert_eq!(config.contributing_types().len(), 2);
    }

    #[test]
    fn test_remove_keeps_registrations_serialized() {
        let registry = ViewRegistry::default();
        registry.register("v", "A", &contribution("a")).unwrap();

        // a handle taken before the removal still guards the view
        let held = registry.inner.locks.get_lock("v");
        assert!(registry.remove("v"));
        let guard = held.lock();

        let late = {
            let registry = registry.clone();
            thread::spawn(move || registry.register("v", "B", &contribution("b")).unwrap())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!registry.contains("v"));

        drop(guard);
        let config = late.join().unwrap();
        assert_eq!(config.contributing_types(), &["B".to_string()]);
        assert_eq!(registry.inner.locks.lock_count(), 1);
    }

    #[test]
    fn test_concurrent_registrations() {
        let registry = ViewRegistry::default();
        let mut handles = vec![];
        for i in 0..16 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                let type_name = format!("Type{}", i % 8);
                let collection = format!("c{}", i % 8);
                registry
                    .register("shared", &type_name, &contribution(&collection))
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let config = registry.properties("shared").unwrap();
        assert_eq!(config.links().len(), 8);
        assert_eq!(config.contributing_types().len(), 8);
    }
}
