//! Scoped lifecycle engine — ordered acquisition, reverse-order release.
//!
//! A [`Manager`] is one instance of a manager type described by a
//! [`Registry`]. [`Manager::setup`] acquires every registered resource in
//! declaration order; [`Manager::close`] releases them in strict reverse
//! order. A failure partway through acquisition unwinds whatever was
//! already acquired before the error is returned.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::registry::{Key, Registry};
use crate::resource::{AnyValue, Disposition, ErasedResource};

/// One successful acquisition awaiting release.
///
/// Holds the engine's own clone of the acquired value: a later
/// [`Manager::set`] changes what [`Manager::get`] returns, but release
/// always pairs with what acquire produced.
struct Acquired {
    name: String,
    value: AnyValue,
    resource: Arc<dyn ErasedResource>,
}

/// Coordinator for a set of named resources with scoped lifetimes.
///
/// Created from a [`Registry`]; multiple instances of the same registry
/// share descriptors but never acquired values. `setup` and `close` take
/// `&mut self`, so exactly one logical task can drive a scope — concurrent
/// entry is impossible by construction, and sequential double-entry fails
/// with [`Error::AlreadyActive`].
pub struct Manager {
    registry: Registry,
    values: HashMap<String, Option<AnyValue>>,
    stack: Vec<Acquired>,
    active: bool,
}

impl Manager {
    pub(crate) fn new(registry: Registry) -> Self {
        let values = registry
            .names()
            .map(|name| (name.to_string(), None))
            .collect();
        Self {
            registry,
            values,
            stack: Vec::new(),
            active: false,
        }
    }

    /// The manager type name, as given to the registry builder.
    #[must_use]
    pub fn name(&self) -> &str {
        self.registry.name()
    }

    /// The registry backing this instance.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether a scope is currently active on this instance.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter the scope: acquire every registered resource in declaration
    /// order.
    ///
    /// Each acquired value is stored before the next resource's acquire
    /// runs, so a resource may read earlier-declared resources through
    /// [`Manager::get`]. If any acquisition fails, everything acquired so
    /// far is released in reverse order and the triggering error is
    /// returned — unless a release step returned
    /// [`Disposition::Suppress`], in which case `setup` returns `Ok` with
    /// the instance reset to its pristine state.
    ///
    /// Cancellation: if this future is dropped mid-acquisition, resources
    /// acquired so far stay registered on the instance; call
    /// [`Manager::close`] to release them.
    pub async fn setup(&mut self) -> Result<()> {
        if self.active {
            return Err(Error::AlreadyActive {
                manager: self.name().to_string(),
            });
        }
        self.active = true;

        let registry = self.registry.clone();
        for entry in registry.entries() {
            let acquired = entry.resource.acquire_any(&*self).await;
            match acquired {
                Ok(value) => {
                    tracing::debug!(
                        manager = %self.name(),
                        resource = %entry.name,
                        "acquired resource"
                    );
                    self.stack.push(Acquired {
                        name: entry.name.clone(),
                        value: Arc::clone(&value),
                        resource: Arc::clone(&entry.resource),
                    });
                    self.set_raw(&entry.name, value)?;
                }
                Err(err) => {
                    tracing::debug!(
                        manager = %self.name(),
                        resource = %entry.name,
                        error = %err,
                        "acquisition failed, unwinding"
                    );
                    return match self.unwind(Some(err)).await {
                        Some(err) => Err(err),
                        None => Ok(()),
                    };
                }
            }
        }
        Ok(())
    }

    /// Exit the scope: release every acquired resource in reverse order.
    ///
    /// A release failure is wrapped with the resource name and does not
    /// stop the remaining releases; the most recent failure is returned,
    /// with any earlier error retained via [`Error::superseded`].
    /// Regardless of the outcome the instance ends up reusable: release
    /// stack empty, all values uninitialized. Calling `close` with no
    /// active scope is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if !self.active && self.stack.is_empty() {
            return Ok(());
        }
        match self.unwind(None).await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run `body` inside a scope: `setup`, the body, then `close`.
    ///
    /// `close` runs whether or not the body fails. A release failure
    /// during that close supersedes a body error (the body error stays
    /// reachable via [`Error::superseded`]). Body errors are always
    /// propagated; [`Disposition::Suppress`] applies to acquisition-phase
    /// unwinds only.
    pub async fn run<T, F>(&mut self, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&Manager) -> Result<T>,
    {
        self.setup().await?;
        let result = body(&*self).await;
        match result {
            Ok(value) => {
                self.close().await?;
                Ok(value)
            }
            Err(body_err) => match self.unwind(None).await {
                Some(mut release_err) => {
                    release_err.chain_superseded(body_err);
                    Err(release_err)
                }
                None => Err(body_err),
            },
        }
    }

    /// Get the current value of resource `name`.
    ///
    /// Fails with [`Error::Unregistered`] for an unknown name,
    /// [`Error::Uninitialized`] before the scope has acquired the value
    /// (or after it exited), and [`Error::TypeMismatch`] if `T` is not the
    /// stored type.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get_raw(name)?
            .downcast::<T>()
            .map_err(|_| Error::TypeMismatch {
                resource: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Untyped variant of [`Manager::get`].
    pub fn get_raw(&self, name: &str) -> Result<AnyValue> {
        match self.values.get(name) {
            None => Err(Error::Unregistered {
                manager: self.name().to_string(),
                resource: name.to_string(),
            }),
            Some(None) => Err(Error::Uninitialized {
                manager: self.name().to_string(),
                resource: name.to_string(),
            }),
            Some(Some(value)) => Ok(Arc::clone(value)),
        }
    }

    /// Get the value named by a typed [`Key`].
    pub fn resolve<T: Send + Sync + 'static>(&self, key: &Key<T>) -> Result<Arc<T>> {
        self.get(key.name())
    }

    /// Overwrite the stored value of resource `name`.
    ///
    /// Fails with [`Error::Unregistered`] for an unknown name. Does not
    /// affect what the resource's release receives at scope exit.
    pub fn set<T: Send + Sync + 'static>(&mut self, name: &str, value: T) -> Result<()> {
        self.set_raw(name, Arc::new(value))
    }

    fn set_raw(&mut self, name: &str, value: AnyValue) -> Result<()> {
        match self.values.get_mut(name) {
            None => Err(Error::Unregistered {
                manager: self.registry.name().to_string(),
                resource: name.to_string(),
            }),
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
        }
    }

    /// Drain the release stack top to bottom, then reset the instance.
    ///
    /// `pending` is the error currently propagating (if any). Returns the
    /// error the caller should surface: the most recent unhandled failure,
    /// or `None` if everything released cleanly or a release suppressed
    /// the pending error.
    async fn unwind(&mut self, mut pending: Option<Error>) -> Option<Error> {
        while let Some(acquired) = self.stack.pop() {
            let outcome = acquired.resource.release_any(acquired.value).await;
            match outcome {
                Ok(Disposition::Propagate) => {
                    tracing::debug!(
                        manager = %self.name(),
                        resource = %acquired.name,
                        "released resource"
                    );
                }
                Ok(Disposition::Suppress) => {
                    if let Some(dropped) = pending.take() {
                        tracing::warn!(
                            manager = %self.name(),
                            resource = %acquired.name,
                            error = %dropped,
                            "release suppressed in-flight error"
                        );
                    }
                }
                Err(err) => {
                    let superseded = pending.take();
                    if let Some(prev) = &superseded {
                        tracing::warn!(
                            manager = %self.name(),
                            resource = %acquired.name,
                            superseded = %prev,
                            "release failure supersedes in-flight error"
                        );
                    }
                    pending = Some(Error::Release {
                        resource: acquired.name,
                        source: Box::new(err),
                        superseded: superseded.map(Box::new),
                    });
                }
            }
        }

        for slot in self.values.values_mut() {
            *slot = None;
        }
        self.active = false;
        pending
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("name", &self.name())
            .field("active", &self.active)
            .field("acquired", &self.stack.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::callback;

    fn registry_with_one() -> Registry {
        Registry::builder("M")
            .register("t1", callback(|_| async { Ok(41u32) }))
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn get_before_setup_is_uninitialized() {
        let manager = registry_with_one().manager();
        let err = manager.get::<u32>("t1").unwrap_err();
        assert!(matches!(err, Error::Uninitialized { .. }));
    }

    #[tokio::test]
    async fn get_unknown_is_unregistered() {
        let manager = registry_with_one().manager();
        let err = manager.get::<u32>("nope").unwrap_err();
        assert!(matches!(err, Error::Unregistered { .. }));
    }

    #[tokio::test]
    async fn get_with_wrong_type_is_mismatch() {
        let mut manager = registry_with_one().manager();
        manager.setup().await.unwrap();
        let err = manager.get::<String>("t1").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_overwrites_value() {
        let mut manager = registry_with_one().manager();
        manager.setup().await.unwrap();
        manager.set("t1", 99u32).unwrap();
        assert_eq!(*manager.get::<u32>("t1").unwrap(), 99);
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_unknown_is_unregistered() {
        let mut manager = registry_with_one().manager();
        let err = manager.set("nope", 1u32).unwrap_err();
        assert!(matches!(err, Error::Unregistered { .. }));
    }

    #[tokio::test]
    async fn double_setup_is_rejected() {
        let mut manager = registry_with_one().manager();
        manager.setup().await.unwrap();
        let err = manager.setup().await.unwrap_err();
        assert!(matches!(err, Error::AlreadyActive { .. }));
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_without_setup_is_noop() {
        let mut manager = registry_with_one().manager();
        manager.close().await.unwrap();
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn debug_skips_values() {
        let manager = registry_with_one().manager();
        let rendered = format!("{manager:?}");
        assert!(rendered.contains("\"M\""));
        assert!(rendered.contains("active: false"));
    }
}
