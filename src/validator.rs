use std::fmt;

use serde::Serialize;

use crate::ast::{Document, NodeId, Tree, Value};
use crate::error::SkemaError;
use crate::schema::{Schema, SchemaId, SchemaNode};
use crate::utils::is_identifier;

/// First place where a value departs from its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Location such as `Root.Nodes[2].Value`.
    pub path: String,
    /// The same location as keys and array indices, root excluded.
    pub segments: Vec<String>,
    pub reason: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// True when the document root satisfies the schema root.
pub fn validate(schema: &Schema, document: &Document) -> Result<bool, SkemaError> {
    Ok(check(schema, document)?.is_none())
}

/// Validate any node of `tree` against any node of `schema`.
pub fn valid(
    schema: &Schema,
    schema_node: SchemaId,
    tree: &Tree,
    value: NodeId,
) -> Result<bool, SkemaError> {
    Ok(check_node(schema, schema_node, tree, value)?.is_none())
}

/// Like [`validate`], reporting where validation failed.
pub fn check(schema: &Schema, document: &Document) -> Result<Option<Mismatch>, SkemaError> {
    check_node(schema, schema.root(), &document.tree, document.root)
}

pub fn check_node(
    schema: &Schema,
    schema_node: SchemaId,
    tree: &Tree,
    value: NodeId,
) -> Result<Option<Mismatch>, SkemaError> {
    if tree.contains_itself(value) {
        return Err(SkemaError::SelfContainment);
    }
    let mut validator = SchemaValidator::new(schema, tree);
    let result = validator.check(schema_node, value)?;
    if let Some(mismatch) = &result {
        tracing::debug!(%mismatch, "validation failed");
    }
    Ok(result)
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

struct SchemaValidator<'a> {
    schema: &'a Schema,
    tree: &'a Tree,
    current_path: Vec<Segment<'a>>,
    /// References followed since the last map or array.
    aliases: Vec<SchemaId>,
}

impl<'a> SchemaValidator<'a> {
    fn new(schema: &'a Schema, tree: &'a Tree) -> Self {
        Self {
            schema,
            tree,
            current_path: Vec::new(),
            aliases: Vec::new(),
        }
    }

    fn mismatch(&self, reason: impl Into<String>) -> Option<Mismatch> {
        let mut path = String::from("Root");
        let mut segments = Vec::with_capacity(self.current_path.len());
        for segment in &self.current_path {
            segments.push(match segment {
                Segment::Key(key) => key.to_string(),
                Segment::Index(i) => i.to_string(),
            });
            match segment {
                Segment::Key(key) if is_identifier(key) => {
                    path.push('.');
                    path.push_str(key);
                }
                Segment::Key(key) => path.push_str(&format!("[{:?}]", key)),
                Segment::Index(i) => path.push_str(&format!("[{}]", i)),
            }
        }
        Some(Mismatch { path, segments, reason: reason.into() })
    }

    fn check(
        &mut self,
        schema_node: SchemaId,
        value: NodeId,
    ) -> Result<Option<Mismatch>, SkemaError> {
        let schema = self.schema;
        let tree = self.tree;
        let found = tree.get(value);

        let expected = match schema.node(schema_node) {
            SchemaNode::Reference { name, resolved } => {
                let target = resolved
                    .ok_or_else(|| SkemaError::UnresolvedReference { name: name.clone() })?;
                if self.aliases.contains(&target) {
                    let reason = format!("reference '#{}' only refers to itself", name);
                    return Ok(self.mismatch(reason));
                }
                self.aliases.push(target);
                let result = self.check(target, value);
                self.aliases.pop();
                return result;
            }
            SchemaNode::Any => return Ok(None),
            SchemaNode::String => matches!(found, Value::String(_)),
            SchemaNode::Integer => matches!(found, Value::Integer(_)),
            SchemaNode::Float => matches!(found, Value::Float(_)),
            SchemaNode::Boolean => matches!(found, Value::Boolean(_)),
            SchemaNode::Datetime => matches!(found, Value::Datetime(_)),
            SchemaNode::Map { fields, optional } => {
                let Value::Map(entries) = found else {
                    return Ok(self.mismatch(format!("expected map, found {}", found.type_name())));
                };
                if let Some(key) = entries.keys().find(|k| !fields.contains_key(*k)) {
                    return Ok(self.mismatch(format!("unknown key '{}'", key)));
                }
                let missing = fields
                    .keys()
                    .find(|k| !optional.contains(*k) && !entries.contains_key(*k));
                if let Some(key) = missing {
                    return Ok(self.mismatch(format!("missing key '{}'", key)));
                }

                let aliases = std::mem::take(&mut self.aliases);
                for (key, field) in fields {
                    let Some(child) = entries.get(key) else { continue };
                    self.current_path.push(Segment::Key(key));
                    let result = self.check(*field, *child)?;
                    self.current_path.pop();
                    if result.is_some() {
                        self.aliases = aliases;
                        return Ok(result);
                    }
                }
                self.aliases = aliases;
                return Ok(None);
            }
            SchemaNode::Array(element) => {
                let Value::Array(items) = found else {
                    let reason = format!("expected array, found {}", found.type_name());
                    return Ok(self.mismatch(reason));
                };

                let aliases = std::mem::take(&mut self.aliases);
                for (i, item) in items.iter().enumerate() {
                    self.current_path.push(Segment::Index(i));
                    let result = self.check(*element, *item)?;
                    self.current_path.pop();
                    if result.is_some() {
                        self.aliases = aliases;
                        return Ok(result);
                    }
                }
                self.aliases = aliases;
                return Ok(None);
            }
        };

        if expected {
            Ok(None)
        } else {
            Ok(self.mismatch(format!(
                "expected {}, found {}",
                schema.node(schema_node).type_name(),
                found.type_name()
            )))
        }
    }
}
