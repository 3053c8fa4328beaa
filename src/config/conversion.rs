// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashMap;

use crate::ast::{NodeId, Tree, Value};
use crate::datetime::Datetime;
use crate::SkemaError;

/// Conversion from a node of a value tree into a Rust type.
///
/// Errors are [`SkemaError::Type`] with an empty path; the config accessors
/// fill in the path that was asked for.
pub trait FromNode: Sized {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError>;
}

fn type_error(expected: &str, found: &Value) -> SkemaError {
    SkemaError::Type {
        path: String::new(),
        expected: expected.into(),
        found: found.type_name().into(),
    }
}

impl FromNode for String {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::String(s) => Ok(s.clone()),
            other => Err(type_error("string", other)),
        }
    }
}

impl FromNode for bool {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Boolean(b) => Ok(*b),
            other => Err(type_error("boolean", other)),
        }
    }
}

impl FromNode for i64 {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Integer(n) => Ok(*n),
            other => Err(type_error("integer", other)),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl FromNode for $ty {
                fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
                    let n = i64::from_node(tree, id)?;
                    <$ty>::try_from(n).map_err(|_| SkemaError::Type {
                        path: String::new(),
                        expected: format!("integer in range for {}", stringify!($ty)),
                        found: n.to_string(),
                    })
                }
            }
        )*
    };
}

narrow_integer!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromNode for f64 {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Float(f) => Ok(*f),
            // integers widen
            Value::Integer(n) => Ok(*n as f64),
            other => Err(type_error("float", other)),
        }
    }
}

impl FromNode for f32 {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        f64::from_node(tree, id).map(|f| f as f32)
    }
}

impl FromNode for Datetime {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Datetime(dt) => Ok(*dt),
            Value::Integer(n) => Datetime::from_timestamp(*n).ok_or_else(|| SkemaError::Type {
                path: String::new(),
                expected: "Unix timestamp in range".into(),
                found: n.to_string(),
            }),
            other => Err(type_error("datetime", other)),
        }
    }
}

impl<T: FromNode> FromNode for Vec<T> {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Array(items) => items.iter().map(|item| T::from_node(tree, *item)).collect(),
            other => Err(type_error("array", other)),
        }
    }
}

impl<T: FromNode> FromNode for Option<T> {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Empty => Ok(None),
            _ => T::from_node(tree, id).map(Some),
        }
    }
}

impl<T: FromNode> FromNode for HashMap<String, T> {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Map(entries) => entries
                .iter()
                .map(|(key, child)| Ok((key.clone(), T::from_node(tree, *child)?)))
                .collect(),
            other => Err(type_error("map", other)),
        }
    }
}

impl FromNode for (String, String) {
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        match tree.get(id) {
            Value::Array(items) if items.len() == 2 => {
                Ok((String::from_node(tree, items[0])?, String::from_node(tree, items[1])?))
            }
            other => Err(type_error("array of two strings", other)),
        }
    }
}

impl FromNode for Value {
    /// Scalars as they are. Maps and arrays still hold ids into `tree`.
    fn from_node(tree: &Tree, id: NodeId) -> Result<Self, SkemaError> {
        Ok(tree.get(id).clone())
    }
}
