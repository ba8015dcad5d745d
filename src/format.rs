//! Document formats and their codecs.
//!
//! # Responsibilities
//! - Name the supported text formats (JSON, TOML, YAML)
//! - Convert between file text and the format-agnostic [`Node`]
//!
//! # Design Decisions
//! - Text handling is delegated entirely to `serde_json`, `toml` and `serde_yaml`
//! - Every format decodes into the same `Node` type so the registry never
//!   branches on format

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// In-memory document tree shared by all formats.
pub type Node = serde_json::Value;

/// Returns the empty document (an empty map).
pub fn empty_node() -> Node {
    Node::Object(serde_json::Map::new())
}

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    /// Human-edited config dialect; default for new configurations.
    #[default]
    Toml,
    Yaml,
}

impl Format {
    /// Display name used in errors, logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Yaml => "yaml",
        }
    }

    /// File extension for documents of this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Yaml => "yml",
        }
    }

    /// The codec implementing this format.
    pub fn codec(self) -> Arc<dyn Codec> {
        match self {
            Format::Json => Arc::new(JsonCodec),
            Format::Toml => Arc::new(TomlCodec),
            Format::Yaml => Arc::new(YamlCodec),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Text <-> [`Node`] conversion for one format.
pub trait Codec: Send + Sync {
    fn format(&self) -> Format;

    fn parse(&self, text: &str) -> Result<Node, CodecError>;

    fn render(&self, node: &Node) -> Result<String, CodecError>;
}

/// JSON documents via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn parse(&self, text: &str) -> Result<Node, CodecError> {
        serde_json::from_str(text).map_err(|e| parse_error(Format::Json, e))
    }

    fn render(&self, node: &Node) -> Result<String, CodecError> {
        let mut text = serde_json::to_string_pretty(node).map_err(|e| render_error(Format::Json, e))?;
        text.push('\n');
        Ok(text)
    }
}

/// TOML documents via `toml`. The document root must be a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn parse(&self, text: &str) -> Result<Node, CodecError> {
        toml::from_str(text).map_err(|e| parse_error(Format::Toml, e))
    }

    fn render(&self, node: &Node) -> Result<String, CodecError> {
        // TOML has no null and no non-table root.
        if !node.is_object() {
            return Err(CodecError::Render {
                format: Format::Toml.name(),
                message: "document root must be a table".to_string(),
            });
        }
        toml::to_string_pretty(node).map_err(|e| render_error(Format::Toml, e))
    }
}

/// YAML documents via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn parse(&self, text: &str) -> Result<Node, CodecError> {
        serde_yaml::from_str(text).map_err(|e| parse_error(Format::Yaml, e))
    }

    fn render(&self, node: &Node) -> Result<String, CodecError> {
        serde_yaml::to_string(node).map_err(|e| render_error(Format::Yaml, e))
    }
}

fn parse_error(format: Format, err: impl std::fmt::Display) -> CodecError {
    CodecError::Parse {
        format: format.name(),
        message: err.to_string(),
    }
}

fn render_error(format: Format, err: impl std::fmt::Display) -> CodecError {
    CodecError::Render {
        format: format.name(),
        message: err.to_string(),
    }
}
