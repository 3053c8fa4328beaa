use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::datetime::Datetime;

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(Datetime),
    Map(IndexMap<String, NodeId>),
    Array(Vec<NodeId>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Datetime(_) => "datetime",
            Value::Map(_) => "map",
            Value::Array(_) => "array",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self { Some(s) } else { None }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(n) = self { Some(*n) } else { None }
    }

    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(n) = self { Some(*n) } else { None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self { Some(*b) } else { None }
    }

    pub fn as_datetime(&self) -> Option<&Datetime> {
        if let Value::Datetime(d) = self { Some(d) } else { None }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, NodeId>> {
        if let Value::Map(entries) = self { Some(entries) } else { None }
    }

    pub fn as_array(&self) -> Option<&[NodeId]> {
        if let Value::Array(items) = self { Some(items) } else { None }
    }

    fn children(&self) -> Vec<NodeId> {
        match self {
            Value::Map(entries) => entries.values().copied().collect(),
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Datetime> for Value {
    fn from(d: Datetime) -> Self {
        Value::Datetime(d)
    }
}

/// Arena owning every value of a document.
///
/// Maps and arrays hold [`NodeId`]s instead of their children, so a map can
/// be inserted into itself without an ownership cycle. Use
/// [`Tree::contains_itself`] to detect that before walking a graph
/// recursively.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Value>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, value: impl Into<Value>) -> NodeId {
        self.nodes.push(value.into());
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_map(&mut self) -> NodeId {
        self.add(Value::Map(IndexMap::new()))
    }

    pub fn add_array(&mut self) -> NodeId {
        self.add(Value::Array(Vec::new()))
    }

    pub fn get(&self, id: NodeId) -> &Value {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Value {
        &mut self.nodes[id.0]
    }

    /// Insert `child` under `key`. Returns false when `map` is not a map.
    pub fn insert(&mut self, map: NodeId, key: impl Into<String>, child: NodeId) -> bool {
        match self.get_mut(map) {
            Value::Map(entries) => {
                entries.insert(key.into(), child);
                true
            }
            _ => false,
        }
    }

    /// Append `child`. Returns false when `array` is not an array.
    pub fn push(&mut self, array: NodeId, child: NodeId) -> bool {
        match self.get_mut(array) {
            Value::Array(items) => {
                items.push(child);
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, map: NodeId, key: &str) -> Option<NodeId> {
        self.get(map).as_map()?.get(key).copied()
    }

    pub fn as_str(&self, id: NodeId) -> Option<&str> {
        self.get(id).as_str()
    }

    pub fn as_integer(&self, id: NodeId) -> Option<i64> {
        self.get(id).as_integer()
    }

    pub fn as_float(&self, id: NodeId) -> Option<f64> {
        self.get(id).as_float()
    }

    pub fn as_bool(&self, id: NodeId) -> Option<bool> {
        self.get(id).as_bool()
    }

    pub fn as_datetime(&self, id: NodeId) -> Option<&Datetime> {
        self.get(id).as_datetime()
    }

    /// True when some container reachable from `id` contains itself,
    /// directly or through descendants.
    pub fn contains_itself(&self, id: NodeId) -> bool {
        let mut on_path = HashSet::new();
        let mut done = HashSet::new();
        self.has_back_edge(id, &mut on_path, &mut done)
    }

    fn has_back_edge(
        &self,
        id: NodeId,
        on_path: &mut HashSet<NodeId>,
        done: &mut HashSet<NodeId>,
    ) -> bool {
        if done.contains(&id) {
            return false;
        }
        if !on_path.insert(id) {
            return true;
        }
        for child in self.get(id).children() {
            if self.has_back_edge(child, on_path, done) {
                return true;
            }
        }
        on_path.remove(&id);
        done.insert(id);
        false
    }

    /// Structural equality between `a` in this tree and `b` in `other`.
    ///
    /// Map entries compare by key regardless of order. Terminates on cyclic
    /// graphs: a pair already under comparison is assumed equal.
    pub fn equivalent(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let mut assumed = HashSet::new();
        self.equivalent_inner(a, other, b, &mut assumed)
    }

    fn equivalent_inner(
        &self,
        a: NodeId,
        other: &Tree,
        b: NodeId,
        assumed: &mut HashSet<(NodeId, NodeId)>,
    ) -> bool {
        match (self.get(a), other.get(b)) {
            (Value::Map(left), Value::Map(right)) => {
                if !assumed.insert((a, b)) {
                    return true;
                }
                left.len() == right.len()
                    && left.iter().all(|(key, &l)| {
                        right
                            .get(key)
                            .is_some_and(|&r| self.equivalent_inner(l, other, r, assumed))
                    })
            }
            (Value::Array(left), Value::Array(right)) => {
                if !assumed.insert((a, b)) {
                    return true;
                }
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right.iter())
                        .all(|(&l, &r)| self.equivalent_inner(l, other, r, assumed))
            }
            (left, right) => left == right,
        }
    }
}

/// Header declarations of a document or schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Format version from `@version`.
    pub version: i64,
    /// Free-form version of the document itself, from `@document`.
    pub document_version: String,
    /// Schema name from `@skema`.
    pub skema: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: crate::FORMAT_VERSION,
            document_version: String::new(),
            skema: None,
        }
    }
}

/// A parsed (or programmatically built) value-language document.
#[derive(Debug, Clone)]
pub struct Document {
    pub tree: Tree,
    pub root: NodeId,
    pub metadata: Option<Metadata>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document whose root is an empty map.
    pub fn new() -> Self {
        let mut tree = Tree::new();
        let root = tree.add_map();
        Self { tree, root, metadata: None }
    }

    pub fn root_value(&self) -> &Value {
        self.tree.get(self.root)
    }

    /// Top-level entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tree.lookup(self.root, key).map(|id| self.tree.get(id))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata && self.tree.equivalent(self.root, &other.tree, other.root)
    }
}
