//! Bundled resource adapters
//!
//! Each adapter produces one value and one release action; the core never
//! inspects adapter values. Network and database adapters are feature
//! gated; the file adapters for bytes, JSON, and path resolution are
//! always available.

pub mod files;

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "web-server")]
pub mod web;

use crate::error::Result;
use crate::manager::Manager;

/// Where an adapter gets its configuration.
///
/// Either a fixed config, or a callback receiving the manager — the
/// callback form lets a config depend on earlier-acquired resources
/// (e.g. a settings file read by a file adapter declared first).
pub enum ConfigSource<C> {
    /// A fixed configuration value.
    Static(C),
    /// Resolved against the manager at acquisition time.
    Callback(Box<dyn Fn(&Manager) -> Result<C> + Send + Sync>),
}

impl<C: Clone> ConfigSource<C> {
    pub(crate) fn resolve(&self, manager: &Manager) -> Result<C> {
        match self {
            Self::Static(config) => Ok(config.clone()),
            Self::Callback(callback) => callback(manager),
        }
    }
}

impl<C: Default> Default for ConfigSource<C> {
    fn default() -> Self {
        Self::Static(C::default())
    }
}

impl<C> std::fmt::Debug for ConfigSource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("ConfigSource::Static"),
            Self::Callback(_) => f.write_str("ConfigSource::Callback"),
        }
    }
}
