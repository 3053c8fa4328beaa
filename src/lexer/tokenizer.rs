use super::*;
use super::scanner::{bump, bump_while, peek_char, peek_char_at, skip_whitespace_and_comments};

pub(super) fn scan_token(lexer: &mut Lexer) -> Token {
    if let Err(open) = skip_whitespace_and_comments(lexer) {
        return Token {
            kind: TokenKind::UnterminatedComment,
            text: lexer.source[open.offset..].to_string(),
            line: open.line,
            column: open.column,
            offset: open.offset,
        };
    }

    let start = Start {
        line: lexer.line,
        column: lexer.column,
        offset: lexer.pos,
    };

    match peek_char(lexer) {
        Some('{') => tokenize_symbol(lexer, start, TokenKind::LBrace),
        Some('}') => tokenize_symbol(lexer, start, TokenKind::RBrace),
        Some('[') => tokenize_symbol(lexer, start, TokenKind::LBracket),
        Some(']') => tokenize_symbol(lexer, start, TokenKind::RBracket),
        Some(',') => tokenize_symbol(lexer, start, TokenKind::Comma),
        Some(':') => tokenize_symbol(lexer, start, TokenKind::Colon),
        Some('#') => tokenize_symbol(lexer, start, TokenKind::Hash),
        Some('@') => tokenize_symbol(lexer, start, TokenKind::At),
        Some('"') => tokenize_string(lexer, start),
        Some('-') if next_is_digit(lexer, 1) => tokenize_number(lexer, start),
        Some(c) if c.is_ascii_digit() => tokenize_number(lexer, start),
        Some(c) if is_ident_start(c) => tokenize_identifier_or_keyword(lexer, start),
        Some(_) => tokenize_unexpected_char(lexer, start),
        None => start.finish(lexer, TokenKind::Eof),
    }
}

struct Start {
    line: usize,
    column: usize,
    offset: usize,
}

impl Start {
    fn finish(self, lexer: &Lexer, kind: TokenKind) -> Token {
        Token {
            kind,
            text: lexer.source[self.offset..lexer.pos].to_string(),
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn tokenize_symbol(lexer: &mut Lexer, start: Start, kind: TokenKind) -> Token {
    bump(lexer);
    start.finish(lexer, kind)
}

/// Scan a `"`-delimited literal. Escapes are kept raw; they are checked when
/// the parser unescapes the value.
fn tokenize_string(lexer: &mut Lexer, start: Start) -> Token {
    bump(lexer); // opening quote
    let content_start = lexer.pos;

    loop {
        match peek_char(lexer) {
            None | Some('\n') | Some('\r') => {
                return Token {
                    kind: TokenKind::BadString,
                    text: lexer.source[content_start..lexer.pos].to_string(),
                    line: start.line,
                    column: start.column,
                    offset: start.offset,
                };
            }
            Some('"') => break,
            Some('\\') => {
                bump(lexer);
                // an escaped newline still ends the literal
                if matches!(peek_char(lexer), Some(c) if c != '\n' && c != '\r') {
                    bump(lexer);
                }
            }
            Some(_) => {
                bump(lexer);
            }
        }
    }

    let text = lexer.source[content_start..lexer.pos].to_string();
    bump(lexer); // closing quote
    Token {
        kind: TokenKind::String,
        text,
        line: start.line,
        column: start.column,
        offset: start.offset,
    }
}

/// Integers, floats, and the datetime shapes that start with digits.
fn tokenize_number(lexer: &mut Lexer, start: Start) -> Token {
    let negative = peek_char(lexer) == Some('-');
    if negative {
        bump(lexer);
    }

    let digits_start = lexer.pos;
    bump_while(lexer, |c| c.is_ascii_digit());
    let digit_count = lexer.pos - digits_start;

    if !negative && digit_count == 4 && peek_char(lexer) == Some('-') && next_is_digit(lexer, 1) {
        bump_while(lexer, |c| c.is_ascii_digit() || c == '-');
        if peek_char(lexer) == Some('T') && next_is_digit(lexer, 1) {
            bump(lexer);
            tokenize_time_tail(lexer);
        }
        return start.finish(lexer, TokenKind::Datetime);
    }

    if !negative && digit_count <= 2 && peek_char(lexer) == Some(':') && next_is_digit(lexer, 1) {
        tokenize_time_tail(lexer);
        return start.finish(lexer, TokenKind::Datetime);
    }

    let mut kind = TokenKind::Integer;
    if peek_char(lexer) == Some('.') && next_is_digit(lexer, 1) {
        bump(lexer);
        bump_while(lexer, |c| c.is_ascii_digit());
        kind = TokenKind::Float;
    }
    if matches!(peek_char(lexer), Some('e') | Some('E')) {
        let signed = matches!(peek_char_at(lexer, 1), Some('+') | Some('-'));
        let digit_at = if signed { 2 } else { 1 };
        if next_is_digit(lexer, digit_at) {
            for _ in 0..digit_at {
                bump(lexer);
            }
            bump_while(lexer, |c| c.is_ascii_digit());
            kind = TokenKind::Float;
        }
    }
    start.finish(lexer, kind)
}

fn next_is_digit(lexer: &Lexer, n: usize) -> bool {
    peek_char_at(lexer, n).is_some_and(|c| c.is_ascii_digit())
}

/// `HH:MM[:SS][.fraction][Z|(+|-)HH:MM]`, shape only.
fn tokenize_time_tail(lexer: &mut Lexer) {
    bump_while(lexer, |c| c.is_ascii_digit() || c == ':');
    if peek_char(lexer) == Some('.') && next_is_digit(lexer, 1) {
        bump(lexer);
        bump_while(lexer, |c| c.is_ascii_digit());
    }
    match peek_char(lexer) {
        Some('Z') => {
            bump(lexer);
        }
        Some('+') | Some('-') if next_is_digit(lexer, 1) => {
            bump(lexer);
            bump_while(lexer, |c| c.is_ascii_digit() || c == ':');
        }
        _ => {}
    }
}

fn tokenize_identifier_or_keyword(lexer: &mut Lexer, start: Start) -> Token {
    bump_while(lexer, is_ident_continue);
    let token = start.finish(lexer, TokenKind::Ident);

    // `word:` is always a key, even when the word is reserved
    if followed_by_colon(lexer) {
        return token;
    }

    let keyword = match (token.text.as_str(), lexer.flavor) {
        ("true", _) => Some(TokenKind::True),
        ("false", _) => Some(TokenKind::False),
        ("null", _) => Some(TokenKind::Null),
        ("define", Flavor::Schema) => Some(TokenKind::Define),
        ("optional", Flavor::Schema) => Some(TokenKind::Optional),
        ("Any", Flavor::Schema) => Some(TokenKind::Any),
        ("String", Flavor::Schema) => Some(TokenKind::StringType),
        ("Integer", Flavor::Schema) => Some(TokenKind::IntegerType),
        ("Float", Flavor::Schema) => Some(TokenKind::FloatType),
        ("Boolean", Flavor::Schema) => Some(TokenKind::BooleanType),
        ("DateTime", Flavor::Schema) => Some(TokenKind::DatetimeType),
        _ => None,
    };

    match keyword {
        Some(kind) => Token { kind, ..token },
        None => token,
    }
}

/// Look past spaces and tabs for a `:` without consuming anything.
fn followed_by_colon(lexer: &Lexer) -> bool {
    lexer.source[lexer.pos..]
        .chars()
        .find(|c| *c != ' ' && *c != '\t')
        == Some(':')
}

fn tokenize_unexpected_char(lexer: &mut Lexer, start: Start) -> Token {
    bump(lexer);
    start.finish(lexer, TokenKind::Invalid)
}
