use std::fmt::Write as _;

use chrono::Datelike;

use crate::ast::{Document, Metadata, NodeId, Tree, Value};
use crate::error::SkemaError;
use crate::schema::{Schema, SchemaId, SchemaNode};
use crate::utils::{escape, is_identifier};

const INDENT: &str = "    ";

/// Canonical text of a document: the header (if any), then one entry per
/// line. Fails without output when the root is not a map, when the value
/// graph contains itself, on a non-finite float, or on a datetime whose year
/// has more than four digits.
pub fn write_document(document: &Document) -> Result<String, SkemaError> {
    if document.tree.contains_itself(document.root) {
        return Err(SkemaError::SelfContainment);
    }
    let Value::Map(entries) = document.tree.get(document.root) else {
        return Err(SkemaError::RootNotMap);
    };

    let mut out = String::new();
    if let Some(metadata) = &document.metadata {
        write_header(&mut out, metadata);
    }
    for (key, child) in entries {
        out.push_str(&format_key(key));
        out.push_str(": ");
        write_node(&mut out, &document.tree, *child, 0)?;
        out.push_str(",\n");
    }
    Ok(out)
}

/// Canonical text of a single value, as it would appear after `Key: `.
pub fn write_value(tree: &Tree, value: NodeId) -> Result<String, SkemaError> {
    if tree.contains_itself(value) {
        return Err(SkemaError::SelfContainment);
    }
    let mut out = String::new();
    write_node(&mut out, tree, value, 0)?;
    Ok(out)
}

/// Canonical text of a schema: header, definitions, then the root fields.
pub fn write_schema(schema: &Schema) -> Result<String, SkemaError> {
    let roots = std::iter::once(schema.root()).chain(schema.definitions().values().copied());
    for id in roots {
        if schema.contains_itself(id) {
            return Err(SkemaError::SelfContainment);
        }
    }
    let SchemaNode::Map { fields, optional } = schema.node(schema.root()) else {
        return Err(SkemaError::RootNotMap);
    };

    let mut out = String::new();
    if let Some(metadata) = &schema.metadata {
        write_header(&mut out, metadata);
    }
    for (name, body) in schema.definitions() {
        out.push_str("define ");
        out.push_str(name);
        out.push_str(": ");
        write_schema_node(&mut out, schema, *body, 0);
        out.push_str(",\n");
    }
    for (key, field) in fields {
        if optional.contains(key) {
            out.push_str("optional ");
        }
        out.push_str(&format_key(key));
        out.push_str(": ");
        write_schema_node(&mut out, schema, *field, 0);
        out.push_str(",\n");
    }
    Ok(out)
}

fn write_header(out: &mut String, metadata: &Metadata) {
    let _ = writeln!(out, "@version {}", metadata.version);
    let _ = writeln!(out, "@document {}", escape(&metadata.document_version));
    if let Some(skema) = &metadata.skema {
        let _ = writeln!(out, "@skema {}", escape(skema));
    }
    out.push('\n');
}

fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        escape(key)
    }
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn write_node(out: &mut String, tree: &Tree, id: NodeId, level: usize) -> Result<(), SkemaError> {
    match tree.get(id) {
        Value::Empty => out.push_str("null"),
        Value::String(s) => out.push_str(&escape(s)),
        Value::Integer(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(SkemaError::NonFiniteFloat { value: *f });
            }
            // Debug keeps a fraction or exponent, so the text reads back as a float
            let _ = write!(out, "{:?}", f);
        }
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Datetime(dt) => {
            if dt.date().is_some_and(|d| !(0..=9999).contains(&d.year())) {
                return Err(SkemaError::DatetimeOutOfRange { value: dt.to_string() });
            }
            let _ = write!(out, "{}", dt);
        }
        Value::Map(entries) if entries.is_empty() => out.push_str("{  }"),
        Value::Map(entries) => {
            out.push_str("{\n");
            for (key, child) in entries {
                indent(out, level + 1);
                out.push_str(&format_key(key));
                out.push_str(": ");
                write_node(out, tree, *child, level + 1)?;
                out.push_str(",\n");
            }
            indent(out, level);
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[  ]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for child in items {
                indent(out, level + 1);
                write_node(out, tree, *child, level + 1)?;
                out.push_str(",\n");
            }
            indent(out, level);
            out.push(']');
        }
    }
    Ok(())
}

fn write_schema_node(out: &mut String, schema: &Schema, id: SchemaId, level: usize) {
    match schema.node(id) {
        SchemaNode::Reference { name, .. } => {
            out.push('#');
            out.push_str(name);
        }
        SchemaNode::Map { fields, .. } if fields.is_empty() => out.push_str("{  }"),
        SchemaNode::Map { fields, optional } => {
            out.push_str("{\n");
            for (key, field) in fields {
                indent(out, level + 1);
                if optional.contains(key) {
                    out.push_str("optional ");
                }
                out.push_str(&format_key(key));
                out.push_str(": ");
                write_schema_node(out, schema, *field, level + 1);
                out.push_str(",\n");
            }
            indent(out, level);
            out.push('}');
        }
        SchemaNode::Array(element) => {
            out.push_str("[\n");
            indent(out, level + 1);
            write_schema_node(out, schema, *element, level + 1);
            out.push_str(",\n");
            indent(out, level);
            out.push(']');
        }
        scalar => out.push_str(scalar.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::Datetime;
    use crate::parser::Parser;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn parse(input: &str) -> Document {
        let mut parser = Parser::new(input);
        let document = parser.parse_document();
        assert_eq!(parser.error_count(), 0, "{:?}\n{}", parser.diagnostics(), input);
        document
    }

    #[test]
    fn test_canonical_layout() {
        let doc = parse("B: [1, 2.5, \"s\"], A: { X: null, Y: { }, Z: [ ] }, \"two words\": true,");
        let text = write_document(&doc).expect("writable");
        assert_eq!(
            text,
            "B: [\n    1,\n    2.5,\n    \"s\",\n],\nA: {\n    X: null,\n    Y: {  },\n    Z: [  ],\n},\n\"two words\": true,\n"
        );
    }

    #[test]
    fn test_header_and_round_trip() {
        let input = "@version 1\n@document \"3\"\n@skema \"Tree\"\nWhen: 2024-02-29T08:15:30.5+01:00, Big: 1e300, Tiny: -0.001, N: -42,";
        let doc = parse(input);
        let text = write_document(&doc).expect("writable");
        assert!(text.starts_with("@version 1\n@document \"3\"\n@skema \"Tree\"\n\n"));
        assert!(text.contains("When: 2024-02-29T08:15:30.5+01:00,\n"));
        assert_eq!(parse(&text), doc);
    }

    #[test]
    fn test_self_containing_document_fails() {
        let mut doc = Document::new();
        let inner = doc.tree.add_array();
        doc.tree.insert(doc.root, "A", inner);
        doc.tree.push(inner, inner);
        assert_eq!(write_document(&doc), Err(SkemaError::SelfContainment));
        assert_eq!(write_value(&doc.tree, inner), Err(SkemaError::SelfContainment));

        let mut doc = Document::new();
        doc.tree.insert(doc.root, "Me", doc.root);
        assert_eq!(write_document(&doc), Err(SkemaError::SelfContainment));
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        let mut doc = Document::new();
        let shared = doc.tree.add(7i64);
        doc.tree.insert(doc.root, "A", shared);
        doc.tree.insert(doc.root, "B", shared);
        assert_eq!(write_document(&doc).expect("writable"), "A: 7,\nB: 7,\n");
    }

    #[test]
    fn test_invalid_roots_and_floats() {
        let mut tree = Tree::new();
        let root = tree.add("text");
        let doc = Document { tree, root, metadata: None };
        assert_eq!(write_document(&doc), Err(SkemaError::RootNotMap));

        let mut doc = Document::new();
        let nan = doc.tree.add(f64::NAN);
        doc.tree.insert(doc.root, "X", nan);
        assert!(matches!(write_document(&doc), Err(SkemaError::NonFiniteFloat { .. })));
    }

    #[test]
    fn test_datetime_year_must_fit_four_digits() {
        let mut doc = Document::new();
        let far = Datetime::from_timestamp(253_402_300_800).expect("year 10000");
        let when = doc.tree.add(far);
        doc.tree.insert(doc.root, "When", when);
        assert_eq!(
            write_document(&doc),
            Err(SkemaError::DatetimeOutOfRange { value: "+10000-01-01T00:00:00Z".into() })
        );

        let mut doc = Document::new();
        let last = Datetime::from_timestamp(253_402_300_799).expect("year 9999");
        let when = doc.tree.add(last);
        doc.tree.insert(doc.root, "When", when);
        let text = write_document(&doc).expect("writable");
        assert_eq!(text, "When: 9999-12-31T23:59:59Z,\n");
        assert_eq!(crate::parse_document(&text).expect("reads back"), doc);
    }

    #[test]
    fn test_write_schema_round_trip() {
        let input = "Tree: #Node, Tags: [ String ], define Node: { Value: Any, optional Nodes: [ #Node ] }, optional Meta: { }, When: DateTime,";
        let mut parser = Parser::new(input);
        let schema = parser.parse_schema();
        assert_eq!(parser.error_count(), 0);

        let text = write_schema(&schema).expect("writable");
        assert_eq!(
            text,
            "define Node: {\n    Value: Any,\n    optional Nodes: [\n        #Node,\n    ],\n},\n\
             Tree: #Node,\nTags: [\n    String,\n],\noptional Meta: {  },\nWhen: DateTime,\n"
        );

        let mut parser = Parser::new(&text);
        let again = parser.parse_schema();
        assert_eq!(parser.error_count(), 0);
        assert_eq!(write_schema(&again).expect("writable"), text);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Empty),
            "[ -~]{0,12}".prop_map(Value::String),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e12..1.0e12f64).prop_map(Value::Float),
            any::<bool>().prop_map(Value::Boolean),
            (1000i32..=9999, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
                let date = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
                Value::Datetime(Datetime::from_date(date))
            }),
        ]
    }

    #[derive(Debug, Clone)]
    enum Shape {
        Leaf(Value),
        Map(Vec<(String, Shape)>),
        Array(Vec<Shape>),
    }

    fn shape() -> impl Strategy<Value = Shape> {
        scalar().prop_map(Shape::Leaf).prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(("[A-Za-z_][A-Za-z0-9_]{0,6}", inner.clone()), 0..4).prop_map(Shape::Map),
                prop::collection::vec(inner, 0..4).prop_map(Shape::Array),
            ]
        })
    }

    fn build(tree: &mut Tree, shape: &Shape) -> NodeId {
        match shape {
            Shape::Leaf(value) => tree.add(value.clone()),
            Shape::Map(entries) => {
                let map = tree.add_map();
                for (key, child) in entries {
                    let id = build(tree, child);
                    tree.insert(map, key.clone(), id);
                }
                map
            }
            Shape::Array(items) => {
                let array = tree.add_array();
                for child in items {
                    let id = build(tree, child);
                    tree.push(array, id);
                }
                array
            }
        }
    }

    proptest! {
        #[test]
        fn prop_write_then_parse_is_equivalent(entries in prop::collection::vec(("[A-Za-z_][A-Za-z0-9_-]{0,6}", shape()), 0..6)) {
            let mut doc = Document::new();
            for (key, child) in &entries {
                let id = build(&mut doc.tree, child);
                doc.tree.insert(doc.root, key.clone(), id);
            }

            let text = write_document(&doc).expect("writable");
            let mut parser = Parser::new(&text);
            let parsed = parser.parse_document();
            prop_assert_eq!(parser.error_count(), 0, "{}", text);
            prop_assert!(parsed.tree.equivalent(parsed.root, &doc.tree, doc.root), "{}", text);
        }
    }
}
