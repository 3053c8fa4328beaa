use super::*;
use crate::ast::{NodeId, Tree, Value};
use crate::datetime::Datetime;
use crate::utils::unescape;

const KEY_START: &[TokenKind] = &[TokenKind::Ident, TokenKind::String, TokenKind::BadString];

const RECOVER: &[TokenKind] = &[
    TokenKind::Comma,
    TokenKind::Ident,
    TokenKind::String,
    TokenKind::RBrace,
    TokenKind::RBracket,
];

const VALUE_START: &[TokenKind] = &[
    TokenKind::String,
    TokenKind::BadString,
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::Datetime,
    TokenKind::True,
    TokenKind::False,
    TokenKind::Null,
    TokenKind::LBrace,
    TokenKind::LBracket,
];

/// `(key ":" value ","?)*` up to `end`, inserting into `map`.
pub(super) fn parse_map_body(parser: &mut Parser, tree: &mut Tree, map: NodeId, end: TokenKind) {
    loop {
        let kind = parser.la().kind;
        if kind == end {
            return;
        }
        match kind {
            TokenKind::Ident | TokenKind::String | TokenKind::BadString => {
                parse_entry(parser, tree, map)
            }
            TokenKind::Eof => {
                parser.expect(end);
                return;
            }
            TokenKind::RBrace | TokenKind::RBracket if end != TokenKind::Eof => return,
            TokenKind::At => {
                parser.syntax_error("Directives must precede the document body", 208);
                parser.bump();
                document::skip_directive_rest(parser);
                continue;
            }
            other => {
                parser.syntax_error(format!("Expected a key, found {}", other), 203);
                parser.bump();
                parser.synchronize(RECOVER);
                if parser.at(TokenKind::Comma) {
                    parser.bump();
                }
                continue;
            }
        }
        parser.weak_separator(end, KEY_START);
    }
}

fn parse_entry(parser: &mut Parser, tree: &mut Tree, map: NodeId) {
    let key_token = parser.la().clone();
    let key = parse_key(parser);

    if !parser.expect(TokenKind::Colon) && !parser.at_any(VALUE_START) {
        parser.synchronize(RECOVER);
        return;
    }

    let child = parse_value(parser, tree);
    if tree.lookup(map, &key).is_some() {
        parser.report_at(
            &key_token,
            DiagnosticKind::Semantic,
            format!("Duplicate key '{}'", key),
            304,
            Some("The first occurrence is kept"),
        );
    } else {
        tree.insert(map, key, child);
    }
}

/// Consume a bare or quoted key.
pub(super) fn parse_key(parser: &mut Parser) -> String {
    parser.bump();
    let token = parser.current().clone();
    match token.kind {
        TokenKind::String => unescape_literal(parser, &token.text),
        TokenKind::BadString => {
            report_bad_string(parser, &token);
            token.text
        }
        _ => token.text,
    }
}

pub(super) fn parse_value(parser: &mut Parser, tree: &mut Tree) -> NodeId {
    match parser.la().kind {
        TokenKind::String => {
            parser.bump();
            let raw = parser.current().text.clone();
            let s = unescape_literal(parser, &raw);
            tree.add(Value::String(s))
        }
        TokenKind::BadString => {
            parser.bump();
            let token = parser.current().clone();
            report_bad_string(parser, &token);
            tree.add(Value::String(token.text))
        }
        TokenKind::Integer => {
            parser.bump();
            let value = match parser.current().text.parse::<i64>() {
                Ok(n) => n,
                Err(_) => {
                    let message = format!("Integer '{}' is out of range", parser.current().text);
                    parser.semantic_error(message, 303);
                    0
                }
            };
            tree.add(Value::Integer(value))
        }
        TokenKind::Float => {
            parser.bump();
            let value = match parser.current().text.parse::<f64>() {
                Ok(n) if n.is_finite() => n,
                _ => {
                    let message = format!("Float '{}' is out of range", parser.current().text);
                    parser.semantic_error(message, 307);
                    0.0
                }
            };
            tree.add(Value::Float(value))
        }
        TokenKind::Datetime => {
            parser.bump();
            let value = match Datetime::parse(&parser.current().text) {
                Some(dt) => dt,
                None => {
                    let message = format!("'{}' is not a valid datetime", parser.current().text);
                    parser.semantic_error(message, 302);
                    Datetime::zero()
                }
            };
            tree.add(Value::Datetime(value))
        }
        TokenKind::True => {
            parser.bump();
            tree.add(Value::Boolean(true))
        }
        TokenKind::False => {
            parser.bump();
            tree.add(Value::Boolean(false))
        }
        TokenKind::Null => {
            parser.bump();
            tree.add(Value::Empty)
        }
        TokenKind::LBrace => parse_map(parser, tree),
        TokenKind::LBracket => parse_array(parser, tree),
        other => {
            parser.syntax_error(format!("Expected a value, found {}", other), 202);
            // leave keys and closers for the enclosing body
            let keep = parser.at_any(&[TokenKind::Comma, TokenKind::Eof, TokenKind::At])
                || parser.at_any(CLOSERS)
                || parser.at_key();
            if !keep {
                parser.bump();
            }
            tree.add(Value::Empty)
        }
    }
}

fn parse_map(parser: &mut Parser, tree: &mut Tree) -> NodeId {
    let map = tree.add_map();
    if !parser.enter() {
        return map;
    }
    parser.bump(); // {
    parse_map_body(parser, tree, map, TokenKind::RBrace);
    parser.expect(TokenKind::RBrace);
    parser.leave();
    map
}

fn parse_array(parser: &mut Parser, tree: &mut Tree) -> NodeId {
    let array = tree.add_array();
    if !parser.enter() {
        return array;
    }
    parser.bump(); // [

    loop {
        let kind = parser.la().kind;
        if kind == TokenKind::RBracket || kind == TokenKind::RBrace || kind == TokenKind::Eof {
            break;
        }
        if parser.at_any(VALUE_START) {
            let child = parse_value(parser, tree);
            tree.push(array, child);
        } else {
            parser.syntax_error(format!("Expected a value, found {}", kind), 202);
            parser.bump();
            parser.synchronize(&[TokenKind::Comma, TokenKind::RBrace, TokenKind::RBracket]);
            if parser.at(TokenKind::Comma) {
                parser.bump();
            }
            continue;
        }
        parser.weak_separator(TokenKind::RBracket, VALUE_START);
    }

    parser.expect(TokenKind::RBracket);
    parser.leave();
    array
}

/// Unescape a string literal body, recording a semantic error and yielding
/// an empty string when an escape is malformed.
pub(super) fn unescape_literal(parser: &mut Parser, raw: &str) -> String {
    match unescape(raw) {
        Ok(s) => s,
        Err(err) => {
            parser.semantic_error(format!("Bad escape in string: {}", err), 301);
            String::new()
        }
    }
}

fn report_bad_string(parser: &mut Parser, token: &Token) {
    parser.report_at(
        token,
        DiagnosticKind::Scan,
        "String literal is not closed",
        103,
        Some("Close the string with '\"' before the end of the line"),
    );
}
