// Author: Dustin Pilgrim
// License: MIT

use std::collections::VecDeque;
use std::fmt;

mod scanner;
mod tokenizer;

pub use scanner::{EncodingFault, decode_source, decode_source_with_faults, read_source};
pub(crate) use tokenizer::{is_ident_continue, is_ident_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // --- literals ---
    Ident,
    String,
    /// String literal cut off by a newline or end of input.
    BadString,
    Integer,
    Float,
    Datetime,

    // --- keywords ---
    True,
    False,
    Null,
    Define,
    Optional,
    Any,
    StringType,
    IntegerType,
    FloatType,
    BooleanType,
    DatetimeType,

    // --- structure ---
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Hash,
    At,

    // --- scan failures ---
    Invalid,
    UnterminatedComment,

    Eof,
}

impl TokenKind {
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Any
                | TokenKind::StringType
                | TokenKind::IntegerType
                | TokenKind::FloatType
                | TokenKind::BooleanType
                | TokenKind::DatetimeType
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Ident => "identifier",
            TokenKind::String => "string",
            TokenKind::BadString => "unterminated string",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::Datetime => "datetime",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::Define => "'define'",
            TokenKind::Optional => "'optional'",
            TokenKind::Any => "'Any'",
            TokenKind::StringType => "'String'",
            TokenKind::IntegerType => "'Integer'",
            TokenKind::FloatType => "'Float'",
            TokenKind::BooleanType => "'Boolean'",
            TokenKind::DatetimeType => "'DateTime'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Hash => "'#'",
            TokenKind::At => "'@'",
            TokenKind::Invalid => "invalid character",
            TokenKind::UnterminatedComment => "unterminated comment",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// Which language the input is written in; decides the keyword set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Document,
    Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Lexeme. String tokens carry the raw text between the quotes, escapes
    /// still in place.
    pub text: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset of the first character.
    pub offset: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    flavor: Flavor,
    lookahead: VecDeque<Token>,
    peek_cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_flavor(input, Flavor::Document)
    }

    pub fn with_flavor(input: &'a str, flavor: Flavor) -> Self {
        Lexer {
            source: input.strip_prefix('\u{feff}').unwrap_or(input),
            pos: 0,
            line: 1,
            column: 1,
            flavor,
            lookahead: VecDeque::new(),
            peek_cursor: 0,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Switch keyword sets. Only meaningful before any token was buffered.
    pub fn set_flavor(&mut self, flavor: Flavor) {
        self.flavor = flavor;
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Consume the next token.
    pub fn next_token(&mut self) -> Token {
        self.peek_cursor = 0;
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => tokenizer::scan_token(self),
        }
    }

    /// The token `next_token` will return, without consuming it.
    pub fn peek_token(&mut self) -> &Token {
        self.fill(1);
        &self.lookahead[0]
    }

    /// Successive lookahead: each call returns the token after the previous
    /// one, starting at the next unconsumed token.
    pub fn peek_ahead(&mut self) -> &Token {
        self.peek_cursor += 1;
        self.fill(self.peek_cursor);
        &self.lookahead[self.peek_cursor - 1]
    }

    /// Rewind `peek_ahead` to the next unconsumed token.
    pub fn reset_peek(&mut self) {
        self.peek_cursor = 0;
    }

    fn fill(&mut self, count: usize) {
        while self.lookahead.len() < count {
            let token = tokenizer::scan_token(self);
            self.lookahead.push_back(token);
        }
    }
}

#[cfg(test)]
mod tests;
