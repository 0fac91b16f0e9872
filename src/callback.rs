//! Closure-backed resources
//!
//! [`CallbackResource`] builds a resource from an async acquire closure and
//! an optional async release closure — the ergonomic layer over the
//! two-phase [`Resource`] contract. [`Manager::get`] is synchronous, so an
//! acquire closure reads earlier resources before constructing its future:
//!
//! ```ignore
//! let sum = callback(|m: &Manager| {
//!     let t1 = m.get::<i64>("t1");
//!     async move { Ok(*t1? + 1) }
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::manager::Manager;
use crate::resource::{Disposition, Resource};

type AcquireFn<V> = dyn for<'a> Fn(&'a Manager) -> BoxFuture<'static, Result<V>> + Send + Sync;
type ReleaseFn<V> = dyn Fn(Arc<V>) -> BoxFuture<'static, Result<Disposition>> + Send + Sync;

/// Resource backed by closures.
///
/// Without a release closure, releasing just drops the value.
pub struct CallbackResource<V> {
    acquire: Box<AcquireFn<V>>,
    release: Option<Box<ReleaseFn<V>>>,
}

impl<V: Send + Sync + 'static> CallbackResource<V> {
    /// Create a resource from an acquire closure.
    pub fn new<F, Fut>(acquire: F) -> Self
    where
        F: Fn(&Manager) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self {
            acquire: Box::new(move |manager: &Manager| {
                let fut = acquire(manager);
                Box::pin(fut) as BoxFuture<'static, Result<V>>
            }),
            release: None,
        }
    }

    /// Attach a release closure, run exactly once per successful acquire.
    pub fn with_release<F, Fut>(mut self, release: F) -> Self
    where
        F: Fn(Arc<V>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Disposition>> + Send + 'static,
    {
        self.release = Some(Box::new(move |value: Arc<V>| {
            Box::pin(release(value)) as BoxFuture<'static, Result<Disposition>>
        }));
        self
    }
}

#[async_trait]
impl<V: Send + Sync + 'static> Resource for CallbackResource<V> {
    type Value = V;

    async fn acquire(&self, manager: &Manager) -> Result<V> {
        (self.acquire)(manager).await
    }

    async fn release(&self, value: Arc<V>) -> Result<Disposition> {
        match &self.release {
            Some(release) => release(value).await,
            None => {
                drop(value);
                Ok(Disposition::Propagate)
            }
        }
    }
}

impl<V> std::fmt::Debug for CallbackResource<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackResource")
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

/// Create a [`CallbackResource`] from an acquire closure.
pub fn callback<V, F, Fut>(acquire: F) -> CallbackResource<V>
where
    V: Send + Sync + 'static,
    F: Fn(&Manager) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    CallbackResource::new(acquire)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::registry::Registry;

    #[tokio::test]
    async fn acquire_and_default_release() {
        let registry = Registry::builder("M").build();
        let manager = registry.manager();
        let resource = callback(|_| async { Ok("hello".to_string()) });

        let value = resource.acquire(&manager).await.unwrap();
        assert_eq!(value, "hello");
        let disposition = resource.release(Arc::new(value)).await.unwrap();
        assert_eq!(disposition, Disposition::Propagate);
    }

    #[tokio::test]
    async fn release_closure_runs() {
        let released: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&released);
        let resource = callback(|_| async { Ok(5u32) }).with_release(move |value: Arc<u32>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(*value);
                Ok(Disposition::Propagate)
            }
        });

        let registry = Registry::builder("M").build();
        let manager = registry.manager();
        let value = resource.acquire(&manager).await.unwrap();
        resource.release(Arc::new(value)).await.unwrap();
        assert_eq!(*released.lock().unwrap(), vec![5]);
    }
}
