// Author: Dustin Pilgrim
// License: MIT

use crate::error::SkemaError;
use crate::schema::{Schema, SchemaId, SchemaNode};

/// Attach every reference reachable from the root or a definition body to
/// its definition.
///
/// Fails with [`SkemaError::CyclicReference`] when required definitions form
/// a cycle, and with [`SkemaError::DefinitionNotFound`] for an unknown name.
/// The schema is left untouched on failure. Running it again on a resolved
/// schema changes nothing.
pub fn resolve(schema: &mut Schema) -> Result<(), SkemaError> {
    let components = strongly_connected_components(schema);
    let cycles: Vec<Vec<String>> = components.into_iter().filter(|c| c.len() > 1).collect();
    if !cycles.is_empty() {
        tracing::warn!(?cycles, "cyclic schema definitions");
        return Err(SkemaError::CyclicReference { components: cycles });
    }

    let mut targets = Vec::new();
    for id in schema.reachable() {
        if let SchemaNode::Reference { name, .. } = schema.node(id) {
            let target = schema
                .definition(name)
                .ok_or_else(|| SkemaError::DefinitionNotFound { name: name.clone() })?;
            targets.push((id, target));
        }
    }

    for (id, target) in &targets {
        if let SchemaNode::Reference { resolved, .. } = schema.node_mut(*id) {
            *resolved = Some(*target);
        }
    }

    tracing::debug!(
        references = targets.len(),
        definitions = schema.definitions().len(),
        "resolved schema"
    );
    Ok(())
}

/// Strongly connected components of the definition graph, by name.
///
/// There is an edge `A -> B` when the body of `A` references `B` without
/// going through an optional field. Unknown names add no edge. Components
/// come out in reverse topological order.
pub fn strongly_connected_components(schema: &Schema) -> Vec<Vec<String>> {
    let definitions = schema.definitions();
    let edges: Vec<Vec<usize>> = definitions
        .values()
        .map(|body| {
            let mut out = Vec::new();
            required_references(schema, *body, &mut |name| {
                if let Some(target) = definitions.get_index_of(name) {
                    out.push(target);
                }
            });
            out
        })
        .collect();

    let mut tarjan = Tarjan::new(&edges);
    for node in 0..edges.len() {
        if tarjan.index[node].is_none() {
            tarjan.connect(node);
        }
    }

    tracing::debug!(components = tarjan.components.len(), "definition graph analyzed");

    tarjan
        .components
        .into_iter()
        .map(|component| {
            component
                .into_iter()
                .filter_map(|i| definitions.get_index(i).map(|(name, _)| name.clone()))
                .collect()
        })
        .collect()
}

/// Names referenced below `id`, skipping optional map fields.
fn required_references(schema: &Schema, id: SchemaId, visit: &mut dyn FnMut(&str)) {
    match schema.node(id) {
        SchemaNode::Reference { name, .. } => visit(name),
        SchemaNode::Map { fields, optional } => {
            for (key, child) in fields {
                if !optional.contains(key) {
                    required_references(schema, *child, visit);
                }
            }
        }
        SchemaNode::Array(element) => required_references(schema, *element, visit),
        _ => {}
    }
}

struct Tarjan<'g> {
    edges: &'g [Vec<usize>],
    next_index: usize,
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl<'g> Tarjan<'g> {
    fn new(edges: &'g [Vec<usize>]) -> Self {
        let n = edges.len();
        Self {
            edges,
            next_index: 0,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            components: Vec::new(),
        }
    }

    fn connect(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.low[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let edges = self.edges;
        for &w in &edges[v] {
            match self.index[w] {
                None => {
                    self.connect(w);
                    self.low[v] = self.low[v].min(self.low[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.low[v] = self.low[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(self.low[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            component.reverse();
            self.components.push(component);
        }
    }
}
