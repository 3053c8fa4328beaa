use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::ast::Metadata;

/// Handle to a node in a [`Schema`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `#Name`; `resolved` is filled in by the resolver.
    Reference { name: String, resolved: Option<SchemaId> },
    Any,
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Map {
        fields: IndexMap<String, SchemaId>,
        optional: IndexSet<String>,
    },
    /// Every element of a matching array must satisfy the element schema.
    Array(SchemaId),
}

impl SchemaNode {
    pub fn reference(name: impl Into<String>) -> Self {
        SchemaNode::Reference { name: name.into(), resolved: None }
    }

    pub fn empty_map() -> Self {
        SchemaNode::Map { fields: IndexMap::new(), optional: IndexSet::new() }
    }

    /// Name used by the schema language for the built-in types.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::Reference { .. } => "reference",
            SchemaNode::Any => "Any",
            SchemaNode::String => "String",
            SchemaNode::Integer => "Integer",
            SchemaNode::Float => "Float",
            SchemaNode::Boolean => "Boolean",
            SchemaNode::Datetime => "DateTime",
            SchemaNode::Map { .. } => "map",
            SchemaNode::Array(_) => "array",
        }
    }
}

/// A schema: an arena of nodes, the root map and the definition table.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    root: SchemaId,
    definitions: IndexMap<String, SchemaId>,
    pub metadata: Option<Metadata>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// A schema whose root is an empty map.
    pub fn new() -> Self {
        let mut schema = Self {
            nodes: Vec::new(),
            root: SchemaId(0),
            definitions: IndexMap::new(),
            metadata: None,
        };
        schema.root = schema.add(SchemaNode::empty_map());
        schema
    }

    pub fn add(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    pub fn root(&self) -> SchemaId {
        self.root
    }

    pub fn set_root(&mut self, root: SchemaId) {
        self.root = root;
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: SchemaId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a field to a map node. Returns false when `map` is not a map.
    pub fn field(
        &mut self,
        map: SchemaId,
        key: impl Into<String>,
        node: SchemaId,
        optional: bool,
    ) -> bool {
        match self.node_mut(map) {
            SchemaNode::Map { fields, optional: optional_keys } => {
                let key = key.into();
                if optional {
                    optional_keys.insert(key.clone());
                } else {
                    optional_keys.shift_remove(&key);
                }
                fields.insert(key, node);
                true
            }
            _ => false,
        }
    }

    /// Register a named definition. Returns the previous body under that name.
    pub fn define(&mut self, name: impl Into<String>, body: SchemaId) -> Option<SchemaId> {
        self.definitions.insert(name.into(), body)
    }

    pub fn definitions(&self) -> &IndexMap<String, SchemaId> {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<SchemaId> {
        self.definitions.get(name).copied()
    }

    /// Nodes directly below `id`. References are leaves here.
    pub fn children(&self, id: SchemaId) -> Vec<SchemaId> {
        match self.node(id) {
            SchemaNode::Map { fields, .. } => fields.values().copied().collect(),
            SchemaNode::Array(element) => vec![*element],
            _ => Vec::new(),
        }
    }

    /// Ids of every node reachable from the root and the definition bodies,
    /// without following resolved references.
    pub fn reachable(&self) -> Vec<SchemaId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<SchemaId> = self.definitions.values().rev().copied().collect();
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        order
    }

    /// True when every reachable reference carries a resolved target.
    pub fn is_resolved(&self) -> bool {
        self.reachable().into_iter().all(|id| {
            !matches!(self.node(id), SchemaNode::Reference { resolved: None, .. })
        })
    }

    /// True when a map or array reaches itself without passing a reference.
    pub fn contains_itself(&self, id: SchemaId) -> bool {
        fn visit(
            schema: &Schema,
            id: SchemaId,
            on_path: &mut HashSet<SchemaId>,
            done: &mut HashSet<SchemaId>,
        ) -> bool {
            if done.contains(&id) {
                return false;
            }
            if !on_path.insert(id) {
                return true;
            }
            if schema.children(id).into_iter().any(|c| visit(schema, c, on_path, done)) {
                return true;
            }
            on_path.remove(&id);
            done.insert(id);
            false
        }
        visit(self, id, &mut HashSet::new(), &mut HashSet::new())
    }
}
