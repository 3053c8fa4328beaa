use super::*;
use crate::schema::{Schema, SchemaId, SchemaNode};

const ENTRY_START: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::String,
    TokenKind::BadString,
    TokenKind::Define,
    TokenKind::Optional,
];

const SKEMA_VALUE_START: &[TokenKind] = &[
    TokenKind::Any,
    TokenKind::StringType,
    TokenKind::IntegerType,
    TokenKind::FloatType,
    TokenKind::BooleanType,
    TokenKind::DatetimeType,
    TokenKind::LBrace,
    TokenKind::LBracket,
    TokenKind::Hash,
];

const RECOVER: &[TokenKind] = &[
    TokenKind::Comma,
    TokenKind::Ident,
    TokenKind::String,
    TokenKind::Define,
    TokenKind::Optional,
    TokenKind::RBrace,
    TokenKind::RBracket,
];

pub(super) fn parse_schema(parser: &mut Parser) -> Schema {
    let mut schema = Schema::new();
    schema.metadata = document::parse_header(parser);

    let root = schema.root();
    parse_skema_map_body(parser, &mut schema, root, TokenKind::Eof);
    schema
}

/// Entries of a schema map up to `end`. `define` clauses land in the
/// definition table wherever they appear.
fn parse_skema_map_body(parser: &mut Parser, schema: &mut Schema, map: SchemaId, end: TokenKind) {
    loop {
        let kind = parser.la().kind;
        if kind == end {
            return;
        }
        match kind {
            TokenKind::Define => parse_definition(parser, schema),
            TokenKind::Optional => {
                parser.bump();
                if parser.at_any(&[TokenKind::Ident, TokenKind::String, TokenKind::BadString]) {
                    parse_field(parser, schema, map, true);
                } else {
                    parser.report(
                        DiagnosticKind::Syntax,
                        format!("Expected a key after 'optional', found {}", parser.la().kind),
                        203,
                        Some("Write 'optional Key: Type'"),
                    );
                    parser.synchronize(RECOVER);
                }
            }
            TokenKind::Ident | TokenKind::String | TokenKind::BadString => {
                parse_field(parser, schema, map, false)
            }
            TokenKind::Eof => {
                parser.expect(end);
                return;
            }
            TokenKind::RBrace | TokenKind::RBracket if end != TokenKind::Eof => return,
            TokenKind::At => {
                parser.syntax_error("Directives must precede the schema body", 208);
                parser.bump();
                document::skip_directive_rest(parser);
                continue;
            }
            other => {
                parser.syntax_error(format!("Expected a field or 'define', found {}", other), 203);
                parser.bump();
                parser.synchronize(RECOVER);
                if parser.at(TokenKind::Comma) {
                    parser.bump();
                }
                continue;
            }
        }
        parser.weak_separator(end, ENTRY_START);
    }
}

fn parse_field(parser: &mut Parser, schema: &mut Schema, map: SchemaId, optional: bool) {
    let key_token = parser.la().clone();
    let key = value::parse_key(parser);

    if !parser.expect(TokenKind::Colon) && !parser.at_any(SKEMA_VALUE_START) {
        parser.synchronize(RECOVER);
        return;
    }

    let node = parse_skema_value(parser, schema);
    let duplicate = match schema.node(map) {
        SchemaNode::Map { fields, .. } => fields.contains_key(&key),
        _ => false,
    };
    if duplicate {
        parser.report_at(
            &key_token,
            DiagnosticKind::Semantic,
            format!("Duplicate field '{}'", key),
            304,
            Some("The first occurrence is kept"),
        );
    } else {
        schema.field(map, key, node, optional);
    }
}

fn parse_definition(parser: &mut Parser, schema: &mut Schema) {
    parser.bump(); // define
    if !parser.expect(TokenKind::Ident) {
        parser.synchronize(RECOVER);
        return;
    }
    let name_token = parser.current().clone();

    if !parser.expect(TokenKind::Colon) && !parser.at_any(SKEMA_VALUE_START) {
        parser.synchronize(RECOVER);
        return;
    }

    let body = parse_skema_value(parser, schema);
    if schema.definition(&name_token.text).is_some() {
        parser.report_at(
            &name_token,
            DiagnosticKind::Semantic,
            format!("Definition '{}' is declared twice", name_token.text),
            305,
            Some("The first definition is kept"),
        );
    } else {
        schema.define(name_token.text, body);
    }
}

fn parse_skema_value(parser: &mut Parser, schema: &mut Schema) -> SchemaId {
    let builtin = match parser.la().kind {
        TokenKind::Any => Some(SchemaNode::Any),
        TokenKind::StringType => Some(SchemaNode::String),
        TokenKind::IntegerType => Some(SchemaNode::Integer),
        TokenKind::FloatType => Some(SchemaNode::Float),
        TokenKind::BooleanType => Some(SchemaNode::Boolean),
        TokenKind::DatetimeType => Some(SchemaNode::Datetime),
        _ => None,
    };
    if let Some(node) = builtin {
        parser.bump();
        return schema.add(node);
    }

    match parser.la().kind {
        TokenKind::LBrace => parse_skema_map(parser, schema),
        TokenKind::LBracket => parse_skema_array(parser, schema),
        TokenKind::Hash => parse_reference(parser, schema),
        other => {
            parser.syntax_error(format!("Expected a type, found {}", other), 202);
            let keep = parser.at_any(&[
                TokenKind::Comma,
                TokenKind::Eof,
                TokenKind::At,
                TokenKind::Define,
                TokenKind::Optional,
            ]) || parser.at_any(CLOSERS)
                || parser.at_key();
            if !keep {
                parser.bump();
            }
            schema.add(SchemaNode::Any)
        }
    }
}

fn parse_skema_map(parser: &mut Parser, schema: &mut Schema) -> SchemaId {
    let map = schema.add(SchemaNode::empty_map());
    if !parser.enter() {
        return map;
    }
    parser.bump(); // {
    parse_skema_map_body(parser, schema, map, TokenKind::RBrace);
    parser.expect(TokenKind::RBrace);
    parser.leave();
    map
}

/// `[ <skema-value> ]`, exactly one element schema.
fn parse_skema_array(parser: &mut Parser, schema: &mut Schema) -> SchemaId {
    let open = parser.la().clone();
    if !parser.enter() {
        let any = schema.add(SchemaNode::Any);
        return schema.add(SchemaNode::Array(any));
    }
    parser.bump(); // [

    let element = if parser.at_any(SKEMA_VALUE_START) {
        let element = parse_skema_value(parser, schema);
        if parser.at(TokenKind::Comma) {
            parser.bump();
        }
        if !parser.at(TokenKind::RBracket) && !parser.at(TokenKind::Eof) {
            parser.report(
                DiagnosticKind::Syntax,
                "An array schema takes exactly one element schema",
                207,
                Some("Write '[ Type ]'; it applies to every element"),
            );
            parser.synchronize(&[TokenKind::RBracket, TokenKind::RBrace]);
        }
        element
    } else {
        parser.report_at(
            &open,
            DiagnosticKind::Syntax,
            "An array schema takes exactly one element schema",
            207,
            Some("Write '[ Type ]'; it applies to every element"),
        );
        parser.synchronize(&[TokenKind::RBracket, TokenKind::RBrace]);
        schema.add(SchemaNode::Any)
    };

    parser.expect(TokenKind::RBracket);
    parser.leave();
    schema.add(SchemaNode::Array(element))
}

/// `#Name`. Keywords are accepted as names.
fn parse_reference(parser: &mut Parser, schema: &mut Schema) -> SchemaId {
    parser.bump(); // #
    let kind = parser.la().kind;
    let is_name = kind == TokenKind::Ident
        || kind.is_type_keyword()
        || matches!(
            kind,
            TokenKind::Define
                | TokenKind::Optional
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        );
    if !is_name {
        parser.report(
            DiagnosticKind::Syntax,
            format!("Expected a definition name after '#', found {}", kind),
            201,
            None,
        );
        return schema.add(SchemaNode::Any);
    }
    parser.bump();
    let name = parser.current().text.clone();
    schema.add(SchemaNode::reference(name))
}
