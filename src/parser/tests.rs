#[cfg(test)]
use super::*;
#[cfg(test)]
use crate::ast::Value;
#[cfg(test)]
use crate::schema::SchemaNode;

fn codes(parser: &Parser) -> Vec<u32> {
    parser.diagnostics().iter().map(|d| d.code).collect()
}

#[test]
fn test_parser_scalar_entries() {
    let mut parser = Parser::new("Key: 10,");
    let doc = parser.parse_document();
    assert_eq!(parser.error_count(), 0);
    assert_eq!(doc.get("Key"), Some(&Value::Integer(10)));

    let mut parser = Parser::new("Key: 1.5,");
    let doc = parser.parse_document();
    assert_eq!(parser.error_count(), 0);
    assert_eq!(doc.get("Key"), Some(&Value::Float(1.5)));

    let mut parser = Parser::new("Key: true,");
    let doc = parser.parse_document();
    assert_eq!(parser.error_count(), 0);
    assert_eq!(doc.get("Key"), Some(&Value::Boolean(true)));
}

#[test]
fn test_parser_full_document_with_header() {
    let input = r#"
@version 1
@document "2.1.0"
@skema "Server"

// main settings
Name: "App",
Port: -8080,
Ratio: 2.5e-1,
Started: 2024-01-15T12:30:00Z,
Nothing: null,
Tags: [ "a", "b", ],
Server: {
    Host: "localhost",
    Empty: {  },
},
"quoted key": [  ],
"#;

    let mut parser = Parser::new(input);
    let doc = parser.parse_document();
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());

    let metadata = doc.metadata.clone().expect("header");
    assert_eq!(metadata.version, 1);
    assert_eq!(metadata.document_version, "2.1.0");
    assert_eq!(metadata.skema.as_deref(), Some("Server"));

    assert_eq!(doc.get("Name"), Some(&Value::String("App".into())));
    assert_eq!(doc.get("Port"), Some(&Value::Integer(-8080)));
    assert_eq!(doc.get("Ratio"), Some(&Value::Float(0.25)));
    assert_eq!(doc.get("Nothing"), Some(&Value::Empty));
    assert_eq!(doc.get("Started").and_then(Value::as_datetime).map(|d| d.to_string()).as_deref(), Some("2024-01-15T12:30:00Z"));

    let tags = doc.tree.lookup(doc.root, "Tags").expect("Tags");
    let items: Vec<_> = doc.tree.get(tags).as_array().expect("array").iter().map(|id| doc.tree.as_str(*id)).collect();
    assert_eq!(items, vec![Some("a"), Some("b")]);

    let server = doc.tree.lookup(doc.root, "Server").expect("Server");
    assert_eq!(doc.tree.lookup(server, "Host").and_then(|id| doc.tree.as_str(id)), Some("localhost"));
    let empty = doc.tree.lookup(server, "Empty").expect("Empty");
    assert_eq!(doc.tree.get(empty).as_map().map(|m| m.len()), Some(0));

    assert!(doc.get("quoted key").is_some());
    let keys: Vec<_> = doc.root_value().as_map().expect("map").keys().cloned().collect();
    assert_eq!(keys, vec!["Name", "Port", "Ratio", "Started", "Nothing", "Tags", "Server", "quoted key"]);
}

#[test]
fn test_trailing_comma_is_optional() {
    let mut parser = Parser::new("A: 1, B: [1, 2], C: { D: 3 }");
    let doc = parser.parse_document();
    assert_eq!(parser.error_count(), 0);
    assert_eq!(doc.root_value().as_map().map(|m| m.len()), Some(3));
}

#[test]
fn test_unterminated_string_keeps_partial_tree() {
    let mut parser = Parser::new("A: \"open\nB: 2,\n");
    let doc = parser.parse_document();

    assert!(parser.error_count() > 0);
    let first = &parser.diagnostics()[0];
    assert_eq!(first.code, 103);
    assert_eq!((first.line, first.column), (1, 4));

    assert_eq!(doc.get("A"), Some(&Value::String("open".into())));
    assert_eq!(doc.get("B"), Some(&Value::Integer(2)));
}

#[test]
fn test_recovery_reports_every_error_in_one_pass() {
    let mut parser = Parser::new("A: 1, B: , C: 3, D: %, E: 5,");
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![202, 101, 202]);
    assert_eq!(doc.get("B"), Some(&Value::Empty));
    assert_eq!(doc.get("C"), Some(&Value::Integer(3)));
    assert_eq!(doc.get("E"), Some(&Value::Integer(5)));
}

#[test]
fn test_missing_colon_and_missing_comma() {
    let mut parser = Parser::new("A 1, B: 2 C: 3,");
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![201, 205]);
    assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
    assert_eq!(doc.get("C"), Some(&Value::Integer(3)));
}

#[test]
fn test_header_order_is_enforced() {
    let mut parser = Parser::new("@document \"1\"\n@version 1\nA: 1,");
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![204, 204]);
    assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
    let metadata = doc.metadata.expect("header");
    assert_eq!(metadata.document_version, "1");
    assert_eq!(metadata.version, 1);
}

#[test]
fn test_missing_document_directive_keeps_skema() {
    let mut parser = Parser::new("@version 1\n@skema \"x\"\nA: 1,");
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![204]);
    assert_eq!(parser.diagnostics()[0].line, 2);
    let metadata = doc.metadata.clone().expect("header");
    assert_eq!(metadata.document_version, "");
    assert_eq!(metadata.skema.as_deref(), Some("x"));
    assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
}

#[test]
fn test_directive_after_body() {
    let mut parser = Parser::new("A: 1,\n@version 1\nB: 2,");
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![208]);
    assert_eq!(doc.get("B"), Some(&Value::Integer(2)));
    assert!(doc.metadata.is_none());
}

#[test]
fn test_unsupported_version_is_semantic() {
    let mut parser = Parser::new("@version 9\n@document \"x\"\n");
    let doc = parser.parse_document();
    assert_eq!(codes(&parser), vec![306]);
    assert_eq!(doc.metadata.map(|m| m.version), Some(9));
}

#[test]
fn test_semantic_errors_use_placeholders() {
    let input = "D: 2024-13-40, S: \"bad \\q\", N: 99999999999999999999, F: 1e400, T: 1700000000,";
    let mut parser = Parser::new(input);
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![302, 301, 303, 307]);
    assert!(parser.diagnostics().iter().all(|d| d.kind == DiagnosticKind::Semantic));
    assert_eq!(doc.get("D").and_then(Value::as_datetime).map(|d| d.to_string()).as_deref(), Some("0001-01-01T00:00:00"));
    assert_eq!(doc.get("S"), Some(&Value::String(String::new())));
    assert_eq!(doc.get("N"), Some(&Value::Integer(0)));
    assert_eq!(doc.get("F"), Some(&Value::Float(0.0)));
    assert_eq!(doc.get("T"), Some(&Value::Integer(1_700_000_000)));
}

#[test]
fn test_string_escapes_and_quoted_keys() {
    let mut parser = Parser::new(r#""a key": "tab\there \u00e9", true: false,"#);
    let doc = parser.parse_document();
    assert_eq!(parser.error_count(), 0);
    assert_eq!(doc.get("a key"), Some(&Value::String("tab\there \u{e9}".into())));
    assert_eq!(doc.get("true"), Some(&Value::Boolean(false)));
}

#[test]
fn test_duplicate_key_keeps_first() {
    let mut parser = Parser::new("A: 1,\nA: 2,");
    let doc = parser.parse_document();
    assert_eq!(codes(&parser), vec![304]);
    assert_eq!(parser.diagnostics()[0].line, 2);
    assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
}

#[test]
fn test_unterminated_comment_is_reported() {
    let mut parser = Parser::new("A: 1, /* open");
    let doc = parser.parse_document();
    assert_eq!(codes(&parser), vec![102]);
    assert_eq!(doc.get("A"), Some(&Value::Integer(1)));
}

#[test]
fn test_unclosed_map_reaches_end_of_input() {
    let mut parser = Parser::new("A: { B: 1,");
    let doc = parser.parse_document();
    assert!(codes(&parser).contains(&201));
    let a = doc.tree.lookup(doc.root, "A").expect("A");
    assert_eq!(doc.tree.lookup(a, "B").and_then(|id| doc.tree.as_integer(id)), Some(1));
}

#[test]
fn test_stray_closer_does_not_loop() {
    let mut parser = Parser::new("A: 1, } ] B: 2,");
    let doc = parser.parse_document();
    assert!(parser.error_count() >= 2);
    assert_eq!(doc.get("B"), Some(&Value::Integer(2)));
}

#[test]
fn test_sink_receives_formatted_diagnostics() {
    let mut out = String::new();
    {
        let mut parser = Parser::new("A: ,").with_sink(&mut out);
        parser.parse_document();
        assert_eq!(parser.error_count(), 1);
    }
    assert!(out.starts_with("[SKEMA] Syntax Error at 1:4:"), "{}", out);
    assert!(out.ends_with("Code: 202\n"), "{}", out);
}

#[test]
fn test_max_depth_skips_deep_constructs() {
    let options = ParseOptions::default().with_max_depth(2);
    let mut parser = Parser::new("A: [[[1]]], B: 2,").with_options(options);
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![206]);
    assert_eq!(doc.get("B"), Some(&Value::Integer(2)));

    let a = doc.tree.lookup(doc.root, "A").expect("A");
    let inner = doc.tree.get(a).as_array().expect("array")[0];
    let innermost = doc.tree.get(inner).as_array().expect("array")[0];
    assert_eq!(doc.tree.get(innermost).as_array().map(|a| a.len()), Some(0));
}

#[test]
fn test_parser_schema_with_definitions() {
    let input = r#"
@version 1
@document "1.0"
define Node: { Value: Any, optional Nodes: [ #Node ] },
Tree: #Node,
Count: Integer,
When: DateTime,
"#;

    let mut parser = Parser::new(input);
    let schema = parser.parse_schema();
    assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
    assert!(schema.metadata.is_some());

    let node = schema.definition("Node").expect("Node");
    match schema.node(node) {
        SchemaNode::Map { fields, optional } => {
            assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["Value", "Nodes"]);
            assert!(optional.contains("Nodes"));
            assert!(!optional.contains("Value"));
            let nodes = fields["Nodes"];
            match schema.node(nodes) {
                SchemaNode::Array(element) => {
                    assert_eq!(schema.node(*element), &SchemaNode::reference("Node"));
                }
                other => panic!("expected array, got {:?}", other),
            }
        }
        other => panic!("expected map, got {:?}", other),
    }

    match schema.node(schema.root()) {
        SchemaNode::Map { fields, optional } => {
            assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["Tree", "Count", "When"]);
            assert!(optional.is_empty());
            assert_eq!(schema.node(fields["Count"]), &SchemaNode::Integer);
            assert_eq!(schema.node(fields["When"]), &SchemaNode::Datetime);
        }
        other => panic!("expected map, got {:?}", other),
    }
    assert!(!schema.is_resolved());
}

#[test]
fn test_schema_array_takes_one_element() {
    let mut parser = Parser::new("A: [ String, Integer ], B: [ ], C: Boolean,");
    let schema = parser.parse_schema();
    assert_eq!(codes(&parser), vec![207, 207]);

    match schema.node(schema.root()) {
        SchemaNode::Map { fields, .. } => {
            assert_eq!(fields.len(), 3);
            assert_eq!(schema.node(fields["C"]), &SchemaNode::Boolean);
        }
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn test_schema_errors_recover() {
    let mut parser = Parser::new("A: Strin, define B: Any, define B: Integer, optional 5: Any, C: Float,");
    let schema = parser.parse_schema();

    assert_eq!(codes(&parser), vec![202, 305, 203]);
    assert_eq!(schema.definitions().len(), 1);
    assert_eq!(schema.definition("B").map(|id| schema.node(id)), Some(&SchemaNode::Any));
    match schema.node(schema.root()) {
        SchemaNode::Map { fields, .. } => assert!(fields.contains_key("C")),
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn test_keyword_names_as_keys_and_references() {
    let mut parser = Parser::new("define String: { optional: Boolean }, Any: #String,");
    let schema = parser.parse_schema();
    assert_eq!(parser.error_count(), 0);
    assert!(schema.definition("String").is_some());
    match schema.node(schema.root()) {
        SchemaNode::Map { fields, .. } => assert_eq!(schema.node(fields["Any"]), &SchemaNode::reference("String")),
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn test_invalid_utf8_in_string_fails_strict_parse() {
    let err = crate::parse_document_bytes(b"Key: \"a\xFFb\",").expect_err("not UTF-8");
    assert!(matches!(err, crate::SkemaError::Parse { .. }));

    let first = &err.diagnostics()[0];
    assert_eq!((first.code, first.line, first.column), (104, 1, 8));
    assert_eq!(err.diagnostics().len(), 1);
}

#[test]
fn test_invalid_utf8_outside_string_is_reported_once() {
    let (source, faults) = crate::lexer::decode_source_with_faults(b"Key: \xFF,\nNext: 1,");
    let mut parser = Parser::new(&source).with_encoding_faults(faults);
    let doc = parser.parse_document();

    assert_eq!(codes(&parser), vec![104, 202]);
    assert_eq!(doc.get("Next"), Some(&Value::Integer(1)));
}
