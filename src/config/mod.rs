// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::ast::{Document, NodeId, Tree, Value};
use crate::lexer;
use crate::resolver;
use crate::schema::Schema;
use crate::SkemaError;

mod access;
mod conversion;
mod helpers;
mod validation;

pub use conversion::FromNode;

/// File extension of schema files found through `@skema`.
pub const SKEMA_EXTENSION: &str = "skema";

/// A parsed document with typed, path-based access and an optional schema.
#[derive(Debug, Clone)]
pub struct SkemaConfig {
    document: Document,
    schema: Option<Schema>,
    raw_content: String, // Store for error reporting
}

impl SkemaConfig {
    /// Load a document and, when its header names one with `@skema "Name"`,
    /// the schema `Name.skema` from the same directory.
    ///
    /// A named schema that does not exist is skipped. One that exists but
    /// fails to parse or resolve is an error.
    ///
    /// # Example
    /// ```ignore
    /// let config = SkemaConfig::from_file("server.conf")?;
    /// config.require_valid()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SkemaError> {
        let path_ref = path.as_ref();
        let bytes = read_file(path_ref)?;
        let mut config = Self::from_bytes(&bytes)?;
        tracing::debug!(path = %path_ref.display(), "loaded document");

        let base_dir = path_ref.parent().unwrap_or_else(|| Path::new("."));
        if let Some(name) = config.document.metadata.as_ref().and_then(|m| m.skema.clone()) {
            let schema_path = resolve_skema_path(&name, base_dir)?;
            if schema_path.exists() {
                let schema_bytes = read_file(&schema_path)?;
                config.schema = Some(crate::parse_schema_bytes(&schema_bytes)?);
                tracing::debug!(path = %schema_path.display(), "attached schema");
            } else {
                tracing::debug!(path = %schema_path.display(), "named schema not found, skipping");
            }
        }
        Ok(config)
    }

    /// Load a document with fallback support
    ///
    /// Tries to load from the primary path first. If that fails with a file
    /// error, attempts to load from the fallback path.
    pub fn from_file_with_fallback<P: AsRef<Path>>(
        primary: P,
        fallback: P,
    ) -> Result<Self, SkemaError> {
        match Self::from_file(&primary) {
            Ok(config) => Ok(config),
            Err(SkemaError::File { .. }) => Self::from_file(&fallback).map_err(|e| match e {
                SkemaError::File { message, .. } => SkemaError::File {
                    message: format!(
                        "Failed to load from primary path '{}' or fallback path '{}': {}",
                        primary.as_ref().display(),
                        fallback.as_ref().display(),
                        message
                    ),
                    path: format!(
                        "{} (fallback: {})",
                        primary.as_ref().display(),
                        fallback.as_ref().display()
                    ),
                },
                other => other,
            }),
            Err(other) => Err(other), // Pass through non-file errors
        }
    }

    /// Parse a document from a string (no file I/O, no schema lookup).
    pub fn from_str(content: &str) -> Result<Self, SkemaError> {
        let document = crate::parse_document(content)?;
        Ok(Self {
            document,
            schema: None,
            raw_content: content.to_string(),
        })
    }

    /// Parse raw bytes, dropping a UTF-8 byte-order mark. Bytes that are not
    /// UTF-8 are a parse error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SkemaError> {
        let (content, faults) = lexer::decode_source_with_faults(bytes);
        let document = crate::parse_decoded_document(&content, faults)?;
        Ok(Self {
            document,
            schema: None,
            raw_content: content.into_owned(),
        })
    }

    /// Read a non-seekable source to the end and parse it.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SkemaError> {
        let bytes = lexer::read_source(reader).map_err(|e| SkemaError::File {
            path: "<reader>".into(),
            message: format!("Failed to read input: {}", e),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Attach a schema, resolving it first if needed.
    pub fn with_schema(mut self, mut schema: Schema) -> Result<Self, SkemaError> {
        if !schema.is_resolved() {
            resolver::resolve(&mut schema)?;
        }
        self.schema = Some(schema);
        Ok(self)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Name from the `@skema` header, if any.
    pub fn schema_name(&self) -> Option<&str> {
        self.document.metadata.as_ref()?.skema.as_deref()
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.document.tree
    }

    pub(crate) fn value(&self, id: NodeId) -> &Value {
        self.document.tree.get(id)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SkemaError> {
    fs::read(path).map_err(|e| SkemaError::File {
        message: format!("Failed to read file: {}", e),
        path: path.to_string_lossy().to_string(),
    })
}

/// Expand "~/" and resolve relative names against base_dir, adding the
/// schema extension when the name has none.
fn resolve_skema_path(name: &str, base_dir: &Path) -> Result<PathBuf, SkemaError> {
    let mut p = if let Some(rest) = name.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| SkemaError::File {
            message: "Could not determine home directory for ~ expansion".into(),
            path: name.to_string(),
        })?;
        home.join(rest)
    } else {
        PathBuf::from(name)
    };

    if p.extension().is_none() {
        p.set_extension(SKEMA_EXTENSION);
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    Ok(p)
}
