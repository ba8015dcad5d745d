//! Registry settings.
//!
//! All fields have defaults, so an empty settings file is valid.
//!
//! ```toml
//! root = "config"
//! default_format = "yaml"
//! missing_file = "fail"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::format::Format;
use crate::loader::MissingFile;

/// Settings a [`ConfigRegistry`](crate::ConfigRegistry) is built from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Directory that keys created through the registry resolve under.
    pub root: PathBuf,

    /// Format of the registry's default loader factory.
    pub default_format: Format,

    /// What the default factory's loaders do when a file does not exist.
    pub missing_file: MissingFile,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("config"),
            default_format: Format::default(),
            missing_file: MissingFile::default(),
        }
    }
}

impl RegistrySettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let settings = Self::from_toml_str(&text).map_err(|e| ConfigError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            root = %settings.root.display(),
            default_format = %settings.default_format,
            "Registry settings loaded"
        );
        Ok(settings)
    }
}
