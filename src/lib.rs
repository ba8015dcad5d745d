//! Lazily loaded, cached configuration documents.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ── ConfigKey<T> ──▶ ConfigRegistry::get_or_create
//!                                   │
//!                        cache hit  │  cache miss (once per key)
//!              ◀────────────────────┤
//!                                   ▼
//!                             LoaderFactory ── create parent dir ──▶ FileLoader
//!                                   │                                 (json/toml/yaml)
//!                                   ▼
//!                         Configuration<T>::load ──▶ cached, shared as Arc
//! ```
//!
//! # Example
//!
//! ```no_run
//! use config_registry::{ConfigKey, ConfigRegistry, FormatLoaderFactory};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Server {
//!     port: u16,
//! }
//!
//! # fn main() -> Result<(), config_registry::ConfigError> {
//! let registry = ConfigRegistry::new();
//! let key: ConfigKey<Server> = ConfigKey::new("server", "config/server.toml");
//! let config = registry.get_or_create(&FormatLoaderFactory::toml(), &key)?;
//! config.update(|server| server.port = 8080)?;
//! config.save()?;
//! # Ok(())
//! # }
//! ```

pub mod configuration;
pub mod error;
pub mod format;
pub mod key;
pub mod loader;
pub mod observability;
pub mod registry;
pub mod settings;

pub use configuration::Configuration;
pub use error::{CodecError, ConfigError, ConfigResult};
pub use format::{Codec, Format, Node};
pub use key::{ConfigKey, KeyId};
pub use loader::{create_loader, FileLoader, FormatLoaderFactory, Loader, LoaderFactory, MissingFile};
pub use registry::ConfigRegistry;
pub use settings::RegistrySettings;
