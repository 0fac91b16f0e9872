//! Embedded web server resource (axum)
//!
//! Binds a listener and serves a user-supplied router for the lifetime of
//! the scope. The router is built through a manager callback, so handlers
//! can capture values of resources declared earlier. Release triggers
//! graceful shutdown and waits for the serve task to finish.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::{Config, Disposition, Resource};
use crate::resources::ConfigSource;

/// Web server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind; `0` picks a free port
    pub port: u16,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

impl Config for WebServerConfig {
    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::configuration("host cannot be empty"));
        }
        Ok(())
    }
}

/// Handle to a running server, the value produced by [`WebServerResource`].
///
/// The shutdown trigger and join handle are take-out slots consumed by
/// release; the bound address stays readable for the whole scope.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl ServerHandle {
    /// The address the server is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

type RouterFn = dyn Fn(&Manager) -> Result<Router> + Send + Sync;

/// Resource running an axum server for the lifetime of the scope.
pub struct WebServerResource {
    routes: Box<RouterFn>,
    config: ConfigSource<WebServerConfig>,
}

impl WebServerResource {
    /// Serve the router built by `routes` with the default bind config.
    pub fn new<F>(routes: F) -> Self
    where
        F: Fn(&Manager) -> Result<Router> + Send + Sync + 'static,
    {
        Self {
            routes: Box::new(routes),
            config: ConfigSource::default(),
        }
    }

    /// Use a fixed bind configuration.
    #[must_use]
    pub fn with_config(mut self, config: WebServerConfig) -> Self {
        self.config = ConfigSource::Static(config);
        self
    }

    /// Resolve the bind configuration through a manager callback.
    pub fn with_config_fn<F>(mut self, config: F) -> Self
    where
        F: Fn(&Manager) -> Result<WebServerConfig> + Send + Sync + 'static,
    {
        self.config = ConfigSource::Callback(Box::new(config));
        self
    }
}

#[async_trait]
impl Resource for WebServerResource {
    type Value = ServerHandle;

    async fn acquire(&self, manager: &Manager) -> Result<ServerHandle> {
        let config = self.config.resolve(manager)?;
        config.validate()?;
        let router = (self.routes)(manager)?;

        let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| {
                Error::acquire_with(
                    format!("failed to bind {}:{}", config.host, config.port),
                    source,
                )
            })?;
        let addr = listener
            .local_addr()
            .map_err(|source| Error::acquire_with("failed to read bound address", source))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let task = tokio::spawn(server.into_future());

        tracing::debug!(%addr, "web server started");
        Ok(ServerHandle {
            addr,
            shutdown: Mutex::new(Some(shutdown_tx)),
            task: Mutex::new(Some(task)),
        })
    }

    async fn release(&self, handle: Arc<ServerHandle>) -> Result<Disposition> {
        if let Some(shutdown) = handle.shutdown.lock().take() {
            let _ = shutdown.send(());
        }
        let task = handle.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|source| Error::internal_with("web server task panicked", source))?
                .map_err(|source| Error::internal_with("web server shutdown failed", source))?;
        }
        tracing::debug!(addr = %handle.addr, "web server stopped");
        Ok(Disposition::Propagate)
    }
}

impl std::fmt::Debug for WebServerResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebServerResource").finish_non_exhaustive()
    }
}
