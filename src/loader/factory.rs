//! Loader factories: key → loader bound to the key's path.
//!
//! # Responsibilities
//! - Create the parent directory of a key's file (idempotent)
//! - Bind a loader to the key's path
//!
//! # Design Decisions
//! - Directory failures are reported, never retried
//! - Formats are plain factory values; the registry never special-cases them

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::format::Format;
use crate::key::KeyId;
use crate::loader::{FileLoader, Loader, MissingFile};

/// Produces a loader for a configuration key.
///
/// Implemented for any `Fn(&KeyId) -> ConfigResult<Arc<dyn Loader>>`, so a
/// closure can stand in for a custom factory.
pub trait LoaderFactory: Send + Sync {
    fn create(&self, key: &KeyId) -> ConfigResult<Arc<dyn Loader>>;
}

impl<F> LoaderFactory for F
where
    F: Fn(&KeyId) -> ConfigResult<Arc<dyn Loader>> + Send + Sync,
{
    fn create(&self, key: &KeyId) -> ConfigResult<Arc<dyn Loader>> {
        self(key)
    }
}

/// Ensure the directory holding `key`'s file exists, then bind a loader to its path.
pub fn create_loader<L, F>(key: &KeyId, path_to_loader: F) -> ConfigResult<L>
where
    F: FnOnce(&Path) -> L,
{
    let path = key.path();
    if path.file_name().is_none() {
        return Err(ConfigError::PathResolution {
            path: path.to_path_buf(),
            message: "path does not name a file".to_string(),
        });
    }

    // A bare file name has an empty parent: the working directory.
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreation {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        _ => {}
    }

    Ok(path_to_loader(path))
}

/// Factory for the built-in file loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLoaderFactory {
    format: Format,
    missing_file: MissingFile,
}

impl FormatLoaderFactory {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            missing_file: MissingFile::default(),
        }
    }

    pub fn json() -> Self {
        Self::new(Format::Json)
    }

    pub fn toml() -> Self {
        Self::new(Format::Toml)
    }

    pub fn yaml() -> Self {
        Self::new(Format::Yaml)
    }

    pub fn missing_file(mut self, policy: MissingFile) -> Self {
        self.missing_file = policy;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

impl LoaderFactory for FormatLoaderFactory {
    fn create(&self, key: &KeyId) -> ConfigResult<Arc<dyn Loader>> {
        create_loader(key, |path| {
            Arc::new(FileLoader::new(path, self.format).missing_file(self.missing_file)) as Arc<dyn Loader>
        })
    }
}
