//! Format-bound document loaders.
//!
//! # Data Flow
//! ```text
//! ConfigKey
//!     → factory.rs (ensure parent directory, bind path + format)
//!     → FileLoader
//!         load: read file → Codec::parse → Node
//!         save: Codec::render → create/truncate/write → sync_all
//! ```
//!
//! # Design Decisions
//! - Loaders hold no document state; the Configuration owns the Node
//! - A document is rendered before the file is opened, so a render failure
//!   never truncates existing content
//! - Saves are whole-file replacements flushed to disk before returning

pub mod factory;

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::format::{empty_node, Codec, Format, Node};

pub use factory::{create_loader, FormatLoaderFactory, LoaderFactory};

/// Read/write capability for one document at one path in one format.
pub trait Loader: Send + Sync {
    /// Path the loader reads from and writes to.
    fn path(&self) -> &Path;

    fn format(&self) -> Format;

    /// Read and parse the whole document.
    fn load(&self) -> Result<Node, CodecError>;

    /// Replace the stored document with `node`.
    fn save(&self, node: &Node) -> Result<(), CodecError>;
}

/// What loading a file that does not exist yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingFile {
    /// An empty map document. Nothing is written until the first save.
    #[default]
    Empty,
    /// A load failure.
    Fail,
}

/// Loader backed by a file on the local filesystem.
pub struct FileLoader {
    path: PathBuf,
    codec: Arc<dyn Codec>,
    missing_file: MissingFile,
}

impl FileLoader {
    /// Create a loader using one of the built-in formats.
    pub fn new(path: impl Into<PathBuf>, format: Format) -> Self {
        Self::with_codec(path, format.codec())
    }

    /// Create a loader using a caller-supplied codec.
    pub fn with_codec(path: impl Into<PathBuf>, codec: Arc<dyn Codec>) -> Self {
        Self {
            path: path.into(),
            codec,
            missing_file: MissingFile::default(),
        }
    }

    pub fn missing_file(mut self, policy: MissingFile) -> Self {
        self.missing_file = policy;
        self
    }
}

impl Loader for FileLoader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> Format {
        self.codec.format()
    }

    fn load(&self) -> Result<Node, CodecError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), policy = ?self.missing_file, "Configuration file not found");
                return match self.missing_file {
                    MissingFile::Empty => Ok(empty_node()),
                    MissingFile::Fail => Err(CodecError::Missing),
                };
            }
            Err(e) => return Err(CodecError::Io(e)),
        };

        if text.trim().is_empty() {
            return Ok(empty_node());
        }

        self.codec.parse(&text)
    }

    fn save(&self, node: &Node) -> Result<(), CodecError> {
        let text = self.codec.render(node)?;

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;

        tracing::debug!(path = %self.path.display(), bytes = text.len(), "Configuration file written");
        Ok(())
    }
}

impl std::fmt::Debug for FileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLoader")
            .field("path", &self.path)
            .field("format", &self.codec.format())
            .field("missing_file", &self.missing_file)
            .finish()
    }
}
