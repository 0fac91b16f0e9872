//! Resource registry — the explicit registration phase
//!
//! A [`Registry`] is the per-manager-type, insertion-ordered collection of
//! resource descriptors. It is built once through [`RegistryBuilder`] and
//! immutable afterwards; every manager instance of that type shares it.
//! Inheritance is an explicit [`RegistryBuilder::inherit`] merge — the
//! parent registry is never mutated, so parent, child, and sibling
//! registries are fully isolated from each other.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::{Erased, ErasedResource, Resource};

/// Typed handle naming a resource slot.
///
/// Pairs a slot name with its value type so lookups need no turbofish:
///
/// ```ignore
/// const DB: Key<PgPool> = Key::new("db");
/// let pool = manager.resolve(&DB)?;
/// ```
pub struct Key<V> {
    name: &'static str,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Key<V> {
    /// Create a key for the slot `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The slot name this key refers to.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<V> std::fmt::Debug for Key<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

pub(crate) struct Entry {
    pub(crate) name: String,
    pub(crate) resource: Arc<dyn ErasedResource>,
}

struct Inner {
    name: String,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

/// Immutable, insertion-ordered resource registry for one manager type.
///
/// Cheap to clone; all instances of a manager type share one registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Start building a registry for the manager type `name`.
    ///
    /// The name identifies the manager type in error messages.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder {
            name: name.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The manager type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the registry has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Whether `name` is a registered resource.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.index.contains_key(name)
    }

    /// Resource names in declaration (= acquisition) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Create a fresh manager instance backed by this registry.
    #[must_use]
    pub fn manager(&self) -> Manager {
        Manager::new(self.clone())
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.inner.entries
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.inner.name)
            .field("resources", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder collecting resource registrations for a [`Registry`].
pub struct RegistryBuilder {
    name: String,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    /// Register a resource under `name`.
    ///
    /// Registration order is acquisition order (and the reverse of release
    /// order). Fails if `name` is already present, own or inherited.
    pub fn register<R: Resource>(self, name: impl Into<String>, resource: R) -> Result<Self> {
        self.register_erased(name.into(), Arc::new(Erased(resource)))
    }

    /// Register a resource under a typed [`Key`].
    pub fn provide<R: Resource>(self, key: &Key<R::Value>, resource: R) -> Result<Self> {
        self.register(key.name(), resource)
    }

    /// Copy every entry of `parent` into this builder, preserving order.
    ///
    /// The parent registry is not affected by anything registered here
    /// afterwards. Fails on any name collision with entries already in the
    /// builder.
    pub fn inherit(mut self, parent: &Registry) -> Result<Self> {
        for entry in parent.entries() {
            self = self.register_erased(entry.name.clone(), Arc::clone(&entry.resource))?;
        }
        Ok(self)
    }

    fn register_erased(mut self, name: String, resource: Arc<dyn ErasedResource>) -> Result<Self> {
        if self.index.contains_key(&name) {
            return Err(Error::Duplicate {
                manager: self.name,
                resource: name,
            });
        }
        tracing::debug!(manager = %self.name, resource = %name, "registered resource");
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Entry { name, resource });
        Ok(self)
    }

    /// Finalize into an immutable [`Registry`].
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            inner: Arc::new(Inner {
                name: self.name,
                entries: self.entries,
                index: self.index,
            }),
        }
    }
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("name", &self.name)
            .field("resources", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::callback;

    fn value_resource(n: u32) -> impl Resource<Value = u32> {
        callback(move |_| async move { Ok(n) })
    }

    #[test]
    fn insertion_order_is_preserved() {
        let registry = Registry::builder("M")
            .register("b", value_resource(1))
            .unwrap()
            .register("a", value_resource(2))
            .unwrap()
            .register("c", value_resource(3))
            .unwrap()
            .build();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = Registry::builder("M")
            .register("t1", value_resource(1))
            .unwrap()
            .register("t1", value_resource(2))
            .unwrap_err();

        assert!(matches!(err, Error::Duplicate { .. }));
        assert_eq!(
            err.to_string(),
            "resource 't1' is already registered in M"
        );
    }

    #[test]
    fn inherit_copies_without_linking() {
        let parent = Registry::builder("Parent")
            .register("t1", value_resource(1))
            .unwrap()
            .build();

        let child = Registry::builder("Child")
            .inherit(&parent)
            .unwrap()
            .register("t2", value_resource(2))
            .unwrap()
            .build();

        assert!(child.contains("t1"));
        assert!(child.contains("t2"));
        assert!(!parent.contains("t2"));
    }

    #[test]
    fn inherited_duplicate_is_rejected() {
        let parent = Registry::builder("Parent")
            .register("t1", value_resource(1))
            .unwrap()
            .build();

        let err = Registry::builder("Child")
            .inherit(&parent)
            .unwrap()
            .register("t1", value_resource(2))
            .unwrap_err();

        assert!(matches!(err, Error::Duplicate { .. }));
    }

    #[test]
    fn sibling_registries_are_isolated() {
        let parent = Registry::builder("Parent")
            .register("t1", value_resource(1))
            .unwrap()
            .build();

        let left = Registry::builder("Left")
            .inherit(&parent)
            .unwrap()
            .register("left_only", value_resource(2))
            .unwrap()
            .build();
        let right = Registry::builder("Right")
            .inherit(&parent)
            .unwrap()
            .register("right_only", value_resource(3))
            .unwrap()
            .build();

        assert!(!left.contains("right_only"));
        assert!(!right.contains("left_only"));
        assert_eq!(parent.len(), 1);
    }

    #[test]
    fn key_names_slot() {
        let key: Key<u32> = Key::new("answer");
        assert_eq!(key.name(), "answer");
        let registry = Registry::builder("M")
            .provide(&key, value_resource(42))
            .unwrap()
            .build();
        assert!(registry.contains("answer"));
    }
}
