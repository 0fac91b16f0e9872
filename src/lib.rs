//! # Quartermaster
//!
//! Declarative async resource lifecycles: named resources are registered
//! on an immutable [`Registry`], and every [`Manager`] instance of that
//! registry acquires them in declaration order on [`Manager::setup`] and
//! releases them in strict reverse order on [`Manager::close`] — including
//! when acquisition fails partway through.
//!
//! ```ignore
//! use quartermaster::{callback, Registry};
//!
//! # async fn demo() -> quartermaster::Result<()> {
//! let registry = Registry::builder("AppResources")
//!     .register("settings", callback(|_| async { Ok(load_settings()) }))?
//!     .register("greeting", callback(|m| {
//!         let settings = m.get::<Settings>("settings");
//!         async move { Ok(format!("hello, {}", settings?.user)) }
//!     }))?
//!     .build();
//!
//! let mut manager = registry.manager();
//! manager.setup().await?;
//! let greeting = manager.get::<String>("greeting")?;
//! manager.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Later-declared resources may read earlier ones during their own
//! acquisition; release order is always the exact reverse of acquisition
//! order, and a failure while entering the scope unwinds everything
//! acquired so far before the error reaches the caller.

pub mod callback;
pub mod error;
pub mod manager;
pub mod registry;
pub mod resource;
pub mod resources;

pub use callback::{CallbackResource, callback};
pub use error::{Error, Result};
pub use manager::Manager;
pub use registry::{Key, Registry, RegistryBuilder};
pub use resource::{AnyValue, Config, Disposition, Resource};
