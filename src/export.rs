// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::ast::{Document, NodeId, Tree, Value};
use crate::SkemaError;

/// Export a SKEMA document to JSON format.
///
/// Converts all SKEMA values to their JSON equivalents:
/// - Strings, numbers, booleans → direct mapping
/// - Datetimes → their canonical text
/// - Maps, arrays → nested JSON structures
/// - Empty → JSON null
///
/// The header, if present, lands under `"metadata"` and the body under
/// `"items"`.
///
/// # Examples
/// ```no_run
/// use skema::{export, parse_document};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let doc = parse_document("Name: \"App\", Port: 8080,")?;
/// println!("{}", export::export_document_to_json(&doc)?);
/// # Ok(())
/// # }
/// ```
pub fn export_document_to_json(doc: &Document) -> Result<String, SkemaError> {
    fn value_to_json(tree: &Tree, id: NodeId) -> Result<serde_json::Value, SkemaError> {
        Ok(match tree.get(id) {
            Value::Empty => serde_json::Value::Null,
            Value::String(s) => json!(s),
            Value::Integer(n) => json!(n),
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(SkemaError::NonFiniteFloat { value: *f });
                }
                json!(f)
            }
            Value::Boolean(b) => json!(b),
            Value::Datetime(dt) => json!(dt.to_string()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|child| value_to_json(tree, *child))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Map(entries) => {
                let mut object = serde_json::Map::new();
                for (key, child) in entries {
                    object.insert(key.clone(), value_to_json(tree, *child)?);
                }
                serde_json::Value::Object(object)
            }
        })
    }

    if doc.tree.contains_itself(doc.root) {
        return Err(SkemaError::SelfContainment);
    }

    let mut top = serde_json::Map::new();
    if let Some(metadata) = &doc.metadata {
        let metadata = serde_json::to_value(metadata).map_err(export_error)?;
        top.insert("metadata".into(), metadata);
    }
    top.insert("items".into(), value_to_json(&doc.tree, doc.root)?);

    serde_json::to_string_pretty(&serde_json::Value::Object(top)).map_err(export_error)
}

fn export_error(e: serde_json::Error) -> SkemaError {
    SkemaError::Export { message: e.to_string() }
}

/// Export a SKEMA file directly to JSON.
///
/// Convenience function that reads, parses, and exports in one call.
///
/// # Errors
/// Returns error if the file can't be read or contains invalid SKEMA syntax.
pub fn export_skema_file(path: impl AsRef<Path>) -> Result<String, SkemaError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| SkemaError::File {
        path: path.display().to_string(),
        message: format!("Failed to read file: {}", e),
    })?;

    let doc = crate::parse_document_bytes(&bytes)?;
    export_document_to_json(&doc)
}
