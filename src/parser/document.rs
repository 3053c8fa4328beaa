use super::*;
use crate::ast::{Document, Metadata};

pub(super) fn parse_document(parser: &mut Parser) -> Document {
    let mut document = Document::new();
    document.metadata = parse_header(parser);

    let root = document.root;
    value::parse_map_body(parser, &mut document.tree, root, TokenKind::Eof);
    document
}

const DIRECTIVES: [&str; 3] = ["version", "document", "skema"];

/// `@version <int> @document <string> [@skema <string>]`, in that order.
///
/// Absent entirely when the input does not start with `@`.
pub(super) fn parse_header(parser: &mut Parser) -> Option<Metadata> {
    if !parser.at(TokenKind::At) {
        return None;
    }
    let mut metadata = Metadata::default();

    if let Some(token) = parse_directive(parser, "version", TokenKind::Integer) {
        match token.text.parse::<i64>() {
            Ok(version) if (1..=crate::FORMAT_VERSION).contains(&version) => {
                metadata.version = version
            }
            Ok(version) => {
                let supported = crate::FORMAT_VERSION;
                tracing::warn!(version, supported, "unsupported format version");
                parser.semantic_error(
                    format!("Unsupported format version {} (supported: {})", version, supported),
                    306,
                );
                metadata.version = version;
            }
            Err(_) => {
                parser.semantic_error(format!("Version '{}' is out of range", token.text), 303)
            }
        }
    }

    if let Some(token) = parse_directive(parser, "document", TokenKind::String) {
        metadata.document_version = value::unescape_literal(parser, &token.text);
    }

    if parser.at(TokenKind::At) {
        if let Some(token) = parse_directive(parser, "skema", TokenKind::String) {
            metadata.skema = Some(value::unescape_literal(parser, &token.text));
        }
    }

    Some(metadata)
}

/// Parse `@name <literal>` and return the literal token.
fn parse_directive(parser: &mut Parser, name: &str, literal: TokenKind) -> Option<Token> {
    if !parser.at(TokenKind::At) {
        parser.report(
            DiagnosticKind::Syntax,
            format!("Expected '@{}', found {}", name, parser.la().kind),
            204,
            Some("The header is @version, @document, then optionally @skema"),
        );
        return None;
    }

    let next = parser.lexer.peek_token().clone();
    if !(next.kind == TokenKind::Ident && next.text == name) {
        parser.report_at(
            &next,
            DiagnosticKind::Syntax,
            format!("Expected directive '@{}', found '@{}'", name, next.text),
            204,
            Some("The header is @version, @document, then optionally @skema"),
        );
        // a later directive stays for its own turn
        if !comes_after(&next.text, name) {
            parser.bump();
            skip_directive_rest(parser);
        }
        return None;
    }
    parser.bump();
    parser.bump();

    if parser.expect(literal) {
        Some(parser.current().clone())
    } else {
        None
    }
}

/// True when `found` is a header directive ordered after `expected`.
fn comes_after(found: &str, expected: &str) -> bool {
    let position = |name: &str| DIRECTIVES.iter().position(|d| *d == name);
    matches!((position(found), position(expected)), (Some(f), Some(e)) if f > e)
}

/// Drop the name and literal of a directive whose `@` was already consumed.
pub(super) fn skip_directive_rest(parser: &mut Parser) {
    if parser.at(TokenKind::Ident) && !parser.at_key() {
        parser.bump();
    }
    if parser.at_any(&[TokenKind::Integer, TokenKind::String, TokenKind::BadString]) {
        parser.bump();
    }
}
