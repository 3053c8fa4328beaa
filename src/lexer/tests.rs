#[cfg(test)]
use super::*;

fn kinds(input: &str, flavor: Flavor) -> Vec<TokenKind> {
    let mut lexer = Lexer::with_flavor(input, flavor);
    let mut out = Vec::new();
    loop {
        let tok = lexer.next_token();
        let done = tok.kind == TokenKind::Eof;
        out.push(tok.kind);
        if done {
            return out;
        }
    }
}

#[test]
fn test_full_document_example() {
    let input = r#"
@version 1
@document "1.0.0"
Name: "App",
Port: 8080,
Ratio: 0.75,
Debug: true,
Started: 2024-01-15T12:30:00Z,
Tags: [ "a", "b", ],
Server: { Host: null, },
"#;

    let expected = vec![
        TokenKind::At,
        TokenKind::Ident,
        TokenKind::Integer,
        TokenKind::At,
        TokenKind::Ident,
        TokenKind::String,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::String,
        TokenKind::Comma,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::Integer,
        TokenKind::Comma,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::Float,
        TokenKind::Comma,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::True,
        TokenKind::Comma,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::Datetime,
        TokenKind::Comma,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::LBracket,
        TokenKind::String,
        TokenKind::Comma,
        TokenKind::String,
        TokenKind::Comma,
        TokenKind::RBracket,
        TokenKind::Comma,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::LBrace,
        TokenKind::Ident,
        TokenKind::Colon,
        TokenKind::Null,
        TokenKind::Comma,
        TokenKind::RBrace,
        TokenKind::Comma,
        TokenKind::Eof,
    ];

    assert_eq!(kinds(input, Flavor::Document), expected);
}

#[test]
fn test_schema_keywords_only_in_schema_flavor() {
    let input = "define Node: { Value: Any, optional Nodes: [ #Node ] }";
    assert_eq!(
        kinds(input, Flavor::Schema),
        vec![
            TokenKind::Define,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::LBrace,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Any,
            TokenKind::Comma,
            TokenKind::Optional,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::LBracket,
            TokenKind::Hash,
            TokenKind::Ident,
            TokenKind::RBracket,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );

    assert_eq!(
        kinds("define Any", Flavor::Document),
        vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
    );
}

#[test]
fn test_keyword_followed_by_colon_is_a_key() {
    assert_eq!(
        kinds("true: false, String : Integer", Flavor::Schema),
        vec![
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::False,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::IntegerType,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_numeric_and_datetime_shapes() {
    let cases = [
        ("42", TokenKind::Integer),
        ("-7", TokenKind::Integer),
        ("1.5", TokenKind::Float),
        ("1e10", TokenKind::Float),
        ("-2.5E-3", TokenKind::Float),
        ("2024-01-15", TokenKind::Datetime),
        ("12:30", TokenKind::Datetime),
        ("12:30:00.125+02:00", TokenKind::Datetime),
        ("2024-01-15T08:00:00Z", TokenKind::Datetime),
    ];

    for (input, kind) in cases {
        let mut lexer = Lexer::new(input);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, kind, "input {:?}", input);
        assert_eq!(tok.text, input);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof, "input {:?}", input);
    }
}

#[test]
fn test_comments_are_skipped_and_nest() {
    let input = "// line\nA /* outer /* inner */ still outer */ : 1";
    assert_eq!(
        kinds(input, Flavor::Document),
        vec![TokenKind::Ident, TokenKind::Colon, TokenKind::Integer, TokenKind::Eof]
    );
}

#[test]
fn test_unterminated_block_comment_is_a_scan_failure() {
    let mut lexer = Lexer::new("A: 1 /* never /* closed */");
    assert_eq!(lexer.next_token().kind, TokenKind::Ident);
    assert_eq!(lexer.next_token().kind, TokenKind::Colon);
    assert_eq!(lexer.next_token().kind, TokenKind::Integer);
    let tok = lexer.next_token();
    assert_eq!(tok.kind, TokenKind::UnterminatedComment);
    assert_eq!((tok.line, tok.column), (1, 6));
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_strings_keep_raw_escapes() {
    let mut lexer = Lexer::new(r#""a\"b\\cA""#);
    let tok = lexer.next_token();
    assert_eq!(tok.kind, TokenKind::String);
    assert_eq!(tok.text, r#"a\"b\\cA"#);
}

#[test]
fn test_unterminated_string_yields_bad_string() {
    let mut lexer = Lexer::new("A: \"open\nB: 2");
    assert_eq!(lexer.next_token().kind, TokenKind::Ident);
    assert_eq!(lexer.next_token().kind, TokenKind::Colon);
    let bad = lexer.next_token();
    assert_eq!(bad.kind, TokenKind::BadString);
    assert_eq!(bad.text, "open");

    let key = lexer.next_token();
    assert_eq!(key.kind, TokenKind::Ident);
    assert_eq!((key.line, key.column), (2, 1));
}

#[test]
fn test_invalid_character_does_not_stop_scanning() {
    let mut lexer = Lexer::new("A: % 1");
    lexer.next_token();
    lexer.next_token();
    let bad = lexer.next_token();
    assert_eq!(bad.kind, TokenKind::Invalid);
    assert_eq!(bad.text, "%");
    assert_eq!(bad.column, 4);
    assert_eq!(lexer.next_token().kind, TokenKind::Integer);
}

#[test]
fn test_line_tracking_treats_crlf_and_cr_as_one_newline() {
    let mut lexer = Lexer::new("A\r\nB\rC\nD");
    let lines: Vec<usize> = (0..4).map(|_| lexer.next_token().line).collect();
    assert_eq!(lines, vec![1, 2, 3, 4]);
}

#[test]
fn test_byte_order_mark_is_dropped() {
    let mut lexer = Lexer::new("\u{feff}A");
    let tok = lexer.next_token();
    assert_eq!(tok.kind, TokenKind::Ident);
    assert_eq!(tok.offset, 0);

    let decoded = decode_source(b"\xEF\xBB\xBFKey: 1");
    assert_eq!(decoded, "Key: 1");
}

#[test]
fn test_read_source_from_non_seekable_reader() {
    let bytes: &[u8] = b"\xEF\xBB\xBFA: 1";
    let buf = read_source(bytes).expect("in-memory read");
    assert_eq!(buf, bytes);
    assert_eq!(decode_source(&buf), "A: 1");
}

#[test]
fn test_invalid_utf8_is_located() {
    let (text, faults) = decode_source_with_faults(b"A: 1,\r\nKey: \"a\xFFb\",");
    assert_eq!(text, "A: 1,\r\nKey: \"a\u{FFFD}b\",");
    assert_eq!(faults, vec![EncodingFault { line: 2, column: 8, offset: 14 }]);

    let (text, faults) = decode_source_with_faults(b"\xEF\xBB\xBFplain");
    assert!(matches!(text, std::borrow::Cow::Borrowed("plain")));
    assert!(faults.is_empty());
}

#[test]
fn test_peek_is_idempotent_and_peek_ahead_resets() {
    let mut lexer = Lexer::new("A: 1,");
    assert_eq!(lexer.peek_token().kind, TokenKind::Ident);
    assert_eq!(lexer.peek_token().kind, TokenKind::Ident);

    assert_eq!(lexer.peek_ahead().kind, TokenKind::Ident);
    assert_eq!(lexer.peek_ahead().kind, TokenKind::Colon);
    assert_eq!(lexer.peek_ahead().kind, TokenKind::Integer);
    lexer.reset_peek();
    assert_eq!(lexer.peek_ahead().kind, TokenKind::Ident);

    assert_eq!(lexer.next_token().kind, TokenKind::Ident);
    assert_eq!(lexer.next_token().kind, TokenKind::Colon);
    assert_eq!(lexer.next_token().kind, TokenKind::Integer);
    assert_eq!(lexer.next_token().kind, TokenKind::Comma);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_hyphen_and_underscore_identifiers() {
    let mut lexer = Lexer::new("foo-bar _qux123");
    let a = lexer.next_token();
    let b = lexer.next_token();
    assert_eq!((a.kind, a.text.as_str()), (TokenKind::Ident, "foo-bar"));
    assert_eq!((b.kind, b.text.as_str()), (TokenKind::Ident, "_qux123"));
}
