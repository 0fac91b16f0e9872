//! HTTP client resource (reqwest)

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::{Config, Resource};
use crate::resources::ConfigSource;

/// HTTP client configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// `User-Agent` header sent with every request
    pub user_agent: Option<String>,
    /// Total per-request timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Maximum idle connections kept per host
    pub pool_max_idle_per_host: Option<usize>,
}

impl Config for HttpClientConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout_ms == Some(0) {
            return Err(Error::configuration("timeout_ms must be non-zero"));
        }
        Ok(())
    }
}

/// Resource yielding a configured [`reqwest::Client`].
///
/// The client is connection-pooled internally; releasing the resource
/// drops it, which closes idle connections.
#[derive(Debug)]
pub struct HttpClientResource {
    config: ConfigSource<HttpClientConfig>,
}

impl HttpClientResource {
    /// Client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ConfigSource::default(),
        }
    }

    /// Client with a fixed configuration.
    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config: ConfigSource::Static(config),
        }
    }

    /// Client configured through a manager callback, so the config can be
    /// read from an earlier-acquired resource.
    pub fn with_config_fn<F>(config: F) -> Self
    where
        F: Fn(&Manager) -> Result<HttpClientConfig> + Send + Sync + 'static,
    {
        Self {
            config: ConfigSource::Callback(Box::new(config)),
        }
    }
}

impl Default for HttpClientResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resource for HttpClientResource {
    type Value = reqwest::Client;

    async fn acquire(&self, manager: &Manager) -> Result<reqwest::Client> {
        let config = self.config.resolve(manager)?;
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(max_idle) = config.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max_idle);
        }

        builder
            .build()
            .map_err(|source| Error::acquire_with("failed to build HTTP client", source))
    }
}
