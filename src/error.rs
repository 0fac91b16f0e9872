//! Error types for resource lifecycle management
use std::path::PathBuf;

use thiserror::Error;

/// Result type for resource operations
pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type covering registration, value access, and scope lifecycle
/// failures.
#[derive(Error, Debug)]
pub enum Error {
    /// A resource name was registered twice on one effective registry
    #[error("resource '{resource}' is already registered in {manager}")]
    Duplicate {
        /// The manager type name
        manager: String,
        /// The resource name
        resource: String,
    },

    /// A resource name is not part of the registry
    #[error("resource '{resource}' is not registered in {manager}")]
    Unregistered {
        /// The manager type name
        manager: String,
        /// The resource name
        resource: String,
    },

    /// A registered resource has not produced a value in the current scope
    #[error("resource '{resource}' is not initialized in {manager}")]
    Uninitialized {
        /// The manager type name
        manager: String,
        /// The resource name
        resource: String,
    },

    /// Scope entry was attempted while a scope is already active
    #[error("{manager} is already set up")]
    AlreadyActive {
        /// The manager type name
        manager: String,
    },

    /// A stored value was requested as a type it does not hold
    #[error("resource '{resource}' does not hold a value of type {expected}")]
    TypeMismatch {
        /// The resource name
        resource: String,
        /// The requested type
        expected: &'static str,
    },

    /// A resource's own acquire logic failed
    #[error("acquisition failed: {message}")]
    Acquire {
        /// The failure reason
        message: String,
        /// The underlying error
        #[source]
        source: Option<BoxError>,
    },

    /// A release action failed during scope exit
    #[error("release failed for resource '{resource}'")]
    Release {
        /// The resource name
        resource: String,
        /// The underlying error
        #[source]
        source: BoxError,
        /// An earlier error this release failure displaced during the
        /// unwind; retained so nothing is silently dropped
        superseded: Option<Box<Error>>,
    },

    /// File I/O failed
    #[error("I/O error for '{path}'")]
    Io {
        /// The path involved
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A file's content could not be decoded
    #[error("failed to decode '{path}' as {format}")]
    Decode {
        /// The path involved
        path: PathBuf,
        /// The expected format
        format: &'static str,
        /// The underlying error
        #[source]
        source: BoxError,
    },

    /// Adapter configuration is invalid
    #[error("configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
        /// The underlying error (if available)
        #[source]
        source: Option<BoxError>,
    },

    /// Generic internal error
    #[error("internal error: {message}")]
    Internal {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    /// Create an acquisition error from a message
    pub fn acquire<S: Into<String>>(message: S) -> Self {
        Self::Acquire {
            message: message.into(),
            source: None,
        }
    }

    /// Create an acquisition error wrapping an underlying cause
    pub fn acquire_with<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Acquire {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error from a message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error wrapping an underlying cause
    pub fn internal_with<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the resource name associated with this error (if any)
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Duplicate { resource, .. }
            | Self::Unregistered { resource, .. }
            | Self::Uninitialized { resource, .. }
            | Self::TypeMismatch { resource, .. }
            | Self::Release { resource, .. } => Some(resource),
            _ => None,
        }
    }

    /// The earlier error displaced by this release failure, if this is a
    /// [`Error::Release`] produced while another error was propagating.
    #[must_use]
    pub fn superseded(&self) -> Option<&Error> {
        match self {
            Self::Release { superseded, .. } => superseded.as_deref(),
            _ => None,
        }
    }

    /// Attach `earlier` at the tail of this error's superseded chain.
    ///
    /// Only meaningful for [`Error::Release`]; other variants carry no
    /// context slot and ignore the call.
    pub(crate) fn chain_superseded(&mut self, earlier: Error) {
        if let Self::Release { superseded, .. } = self {
            match superseded {
                Some(inner) => inner.chain_superseded(earlier),
                None => *superseded = Some(Box::new(earlier)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_manager_and_resource() {
        let err = Error::Duplicate {
            manager: "AppResources".into(),
            resource: "db".into(),
        };
        assert_eq!(
            err.to_string(),
            "resource 'db' is already registered in AppResources"
        );
    }

    #[test]
    fn resource_accessor() {
        let err = Error::Uninitialized {
            manager: "M".into(),
            resource: "t1".into(),
        };
        assert_eq!(err.resource(), Some("t1"));
        assert!(Error::acquire("boom").resource().is_none());
    }

    #[test]
    fn superseded_chain_attaches_at_tail() {
        let mut err = Error::Release {
            resource: "b".into(),
            source: Box::new(std::io::Error::other("late")),
            superseded: Some(Box::new(Error::Release {
                resource: "a".into(),
                source: Box::new(std::io::Error::other("later")),
                superseded: None,
            })),
        };
        err.chain_superseded(Error::acquire("original"));

        let first = err.superseded().expect("first link");
        assert_eq!(first.resource(), Some("a"));
        let tail = first.superseded().expect("tail link");
        assert!(matches!(tail, Error::Acquire { .. }));
    }

    #[test]
    fn source_chain_is_preserved() {
        use std::error::Error as _;
        let err = Error::acquire_with("connect failed", std::io::Error::other("refused"));
        assert!(err.source().is_some());
    }
}
