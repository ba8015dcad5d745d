//! A loaded configuration document and its typed view.
//!
//! # Responsibilities
//! - Hold the most recently loaded [`Node`] for one key
//! - Load, reload and save it through the key's loader
//! - Bind the node to and from the key's typed shape
//!
//! # Design Decisions
//! - The node is the source of truth; typed values are produced on demand
//! - The node lock guards single reads and writes only; sequencing several
//!   load/save calls is the caller's concern
//! - Nothing is retried; every failure is returned to the caller

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::format::{empty_node, Format, Node};
use crate::key::ConfigKey;
use crate::loader::Loader;
use crate::observability::metrics;

/// One configuration document: its key, its loader and its loaded node.
pub struct Configuration<T> {
    key: ConfigKey<T>,
    loader: Arc<dyn Loader>,
    node: RwLock<Node>,
}

impl<T> Configuration<T> {
    /// Create an unloaded configuration holding an empty document.
    pub fn new(key: ConfigKey<T>, loader: Arc<dyn Loader>) -> Self {
        Self {
            key,
            loader,
            node: RwLock::new(empty_node()),
        }
    }

    pub fn key(&self) -> &ConfigKey<T> {
        &self.key
    }

    /// Path the document is read from and written to.
    pub fn path(&self) -> &Path {
        self.loader.path()
    }

    pub fn format(&self) -> Format {
        self.loader.format()
    }

    pub fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    /// Read the document from storage and replace the held node.
    ///
    /// On failure the held node is left as it was.
    pub fn load(&self) -> ConfigResult<()> {
        let result = self.loader.load();
        metrics::record_load(self.format(), result.is_ok());

        let node = result.map_err(|source| ConfigError::Load {
            path: self.path().to_path_buf(),
            source,
        })?;

        *self.node.write().unwrap_or_else(PoisonError::into_inner) = node;
        tracing::debug!(key = %self.key.name(), path = %self.path().display(), "Configuration loaded");
        Ok(())
    }

    /// Re-read the document, discarding unsaved in-memory changes.
    pub fn reload(&self) -> ConfigResult<()> {
        self.load()
    }

    /// Write the held node back to storage.
    pub fn save(&self) -> ConfigResult<()> {
        let result = {
            let node = self.node.read().unwrap_or_else(PoisonError::into_inner);
            self.loader.save(&node)
        };
        metrics::record_save(self.format(), result.is_ok());

        result.map_err(|source| ConfigError::Save {
            path: self.path().to_path_buf(),
            source,
        })?;

        tracing::debug!(key = %self.key.name(), path = %self.path().display(), "Configuration saved");
        Ok(())
    }

    /// Snapshot of the held node.
    pub fn node(&self) -> Node {
        self.node.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the held node without touching storage.
    pub fn replace_node(&self, node: Node) {
        *self.node.write().unwrap_or_else(PoisonError::into_inner) = node;
    }
}

impl<T> Configuration<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind the held node to `T`.
    pub fn get(&self) -> ConfigResult<T> {
        serde_json::from_value(self.node()).map_err(|source| self.binding_error(source))
    }

    /// Replace the held node with `value`. Storage is untouched until [`save`](Self::save).
    pub fn set(&self, value: &T) -> ConfigResult<()> {
        let node = serde_json::to_value(value).map_err(|source| self.binding_error(source))?;
        self.replace_node(node);
        Ok(())
    }

    /// Bind, modify and store back the typed value, returning the new value.
    pub fn update<F>(&self, f: F) -> ConfigResult<T>
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.get()?;
        f(&mut value);
        self.set(&value)?;
        Ok(value)
    }

    fn binding_error(&self, source: serde_json::Error) -> ConfigError {
        ConfigError::Binding {
            key: self.key.name().to_string(),
            source,
        }
    }
}

impl<T> std::fmt::Debug for Configuration<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("key", &self.key)
            .field("path", &self.path())
            .field("format", &self.format())
            .finish_non_exhaustive()
    }
}
