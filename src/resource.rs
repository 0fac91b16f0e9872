//! Core resource contract
//!
//! The [`Resource`] trait is the two-phase descriptor contract: `acquire`
//! produces a value for the current scope, `release` tears it down. The
//! manager guarantees acquire is called at most once per scope and release
//! exactly once per successful acquire, in LIFO order across resources.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::manager::Manager;

/// Type-erased acquired value as stored in a manager's slots.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Signal returned by [`Resource::release`].
///
/// During an unwind triggered by a failure, `Suppress` swallows the error
/// that is currently propagating. Suppression must be an explicit choice;
/// no bundled adapter uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Let any in-flight error keep propagating.
    #[default]
    Propagate,
    /// Swallow the error currently unwinding the scope, if any.
    Suppress,
}

/// Configuration trait for resource adapters.
///
/// Implementations must be deserializable so adapters can be parameterized
/// from config blobs; `validate` runs before the adapter connects.
pub trait Config: serde::de::DeserializeOwned + Send + Sync + 'static {
    /// Validate the configuration, returning an error if invalid.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// A named, lazily-acquired value with a deterministic release action.
///
/// Resources are registered on a [`Registry`](crate::registry::Registry)
/// under a name; the name belongs to the registry entry, not the resource
/// itself, so one resource instance may back several slots. `acquire`
/// receives the owning manager and may read the values of resources
/// declared earlier in the same registry via [`Manager::get`].
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// The value type produced by this resource.
    type Value: Send + Sync + 'static;

    /// Acquire the value for the current scope.
    async fn acquire(&self, manager: &Manager) -> Result<Self::Value>;

    /// Release a previously acquired value.
    ///
    /// Receives the manager's own clone of the `Arc` that `acquire`
    /// produced — a later [`Manager::set`] does not change what gets
    /// released.
    async fn release(&self, value: Arc<Self::Value>) -> Result<Disposition> {
        drop(value);
        Ok(Disposition::Propagate)
    }
}

/// A shared resource instance may back several slots: every registration of
/// the same `Arc` reuses the same underlying object.
#[async_trait]
impl<R: Resource> Resource for Arc<R> {
    type Value = R::Value;

    async fn acquire(&self, manager: &Manager) -> Result<Self::Value> {
        R::acquire(self, manager).await
    }

    async fn release(&self, value: Arc<Self::Value>) -> Result<Disposition> {
        R::release(self, value).await
    }
}

/// Object-safe form of [`Resource`] stored in registry entries.
#[async_trait]
pub(crate) trait ErasedResource: Send + Sync {
    async fn acquire_any(&self, manager: &Manager) -> Result<AnyValue>;

    async fn release_any(&self, value: AnyValue) -> Result<Disposition>;
}

/// Adapter from a typed [`Resource`] to [`ErasedResource`].
pub(crate) struct Erased<R: Resource>(pub(crate) R);

#[async_trait]
impl<R: Resource> ErasedResource for Erased<R> {
    async fn acquire_any(&self, manager: &Manager) -> Result<AnyValue> {
        let value = self.0.acquire(manager).await?;
        Ok(Arc::new(value) as AnyValue)
    }

    async fn release_any(&self, value: AnyValue) -> Result<Disposition> {
        let value = value
            .downcast::<R::Value>()
            .map_err(|_| Error::internal("released value had an unexpected type"))?;
        self.0.release(value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    struct Unit;

    #[async_trait]
    impl Resource for Unit {
        type Value = u32;

        async fn acquire(&self, _manager: &Manager) -> Result<u32> {
            Ok(7)
        }
    }

    #[tokio::test]
    async fn erased_round_trip() {
        let registry = Registry::builder("M").build();
        let manager = registry.manager();
        let erased = Erased(Unit);

        let value = erased.acquire_any(&manager).await.unwrap();
        assert_eq!(*value.clone().downcast::<u32>().unwrap(), 7);

        let disposition = erased.release_any(value).await.unwrap();
        assert_eq!(disposition, Disposition::Propagate);
    }

    #[tokio::test]
    async fn erased_release_rejects_foreign_value() {
        let erased = Erased(Unit);
        let foreign: AnyValue = Arc::new("not a u32".to_string());
        let err = erased.release_any(foreign).await.unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }

    #[tokio::test]
    async fn shared_instance_delegates() {
        let registry = Registry::builder("M").build();
        let manager = registry.manager();
        let shared = Arc::new(Unit);
        assert_eq!(shared.acquire(&manager).await.unwrap(), 7);
    }
}
