use std::fmt;
use std::fmt::Write as _;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::lexer::{EncodingFault, Flavor, Lexer, Token, TokenKind};

mod document;
mod schema;
mod value;

pub(crate) const CLOSERS: &[TokenKind] = &[TokenKind::RBrace, TokenKind::RBracket];

/// Knobs for a single parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest map/array nesting accepted before the parser skips the
    /// construct and reports an error.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Recursive-descent parser for both the value and the schema language.
///
/// Errors never abort a parse. Each one is recorded, written to the sink if
/// one was injected, and the parser resynchronizes at the next token that can
/// continue the current construct. Check [`Parser::error_count`] before
/// trusting the returned tree.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Last consumed token.
    current: Token,
    /// Lookahead token.
    la: Token,
    primed: bool,
    depth: usize,
    options: ParseOptions,
    /// Invalid UTF-8 found while decoding the input bytes.
    encoding_faults: Vec<EncodingFault>,
    diagnostics: Vec<Diagnostic>,
    sink: Option<Box<dyn fmt::Write + 'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let placeholder = Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line: 1,
            column: 1,
            offset: 0,
        };
        Self {
            lexer: Lexer::new(input),
            current: placeholder.clone(),
            la: placeholder,
            primed: false,
            depth: 0,
            options: ParseOptions::default(),
            encoding_faults: Vec::new(),
            diagnostics: Vec::new(),
            sink: None,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Report invalid UTF-8 that [`crate::lexer::decode_source_with_faults`]
    /// replaced in the input, so it cannot pass as U+FFFD.
    pub fn with_encoding_faults(mut self, faults: Vec<EncodingFault>) -> Self {
        self.encoding_faults = faults;
        self
    }

    /// Write every diagnostic to `sink` as it is recorded.
    pub fn with_sink<W: fmt::Write + 'a>(mut self, sink: W) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn parse_document(&mut self) -> crate::ast::Document {
        self.prime(Flavor::Document);
        let document = document::parse_document(self);
        tracing::debug!(
            errors = self.error_count(),
            nodes = document.tree.len(),
            "parsed document"
        );
        document
    }

    /// Parse a schema. References are left unresolved; see
    /// [`crate::resolver::resolve`].
    pub fn parse_schema(&mut self) -> crate::schema::Schema {
        self.prime(Flavor::Schema);
        let schema = schema::parse_schema(self);
        tracing::debug!(
            errors = self.error_count(),
            definitions = schema.definitions().len(),
            "parsed schema"
        );
        schema
    }

    fn prime(&mut self, flavor: Flavor) {
        if !self.primed {
            self.lexer.set_flavor(flavor);
            self.primed = true;
            for fault in self.encoding_faults.clone() {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::Scan,
                    "Input is not valid UTF-8",
                    fault.line,
                    fault.column,
                    104,
                )
                .with_hint("Save the file as UTF-8");
                self.record(diagnostic);
            }
            self.bump();
        }
    }

    /// Move to the next token, reporting scan failures on the way.
    pub(crate) fn bump(&mut self) {
        loop {
            let next = self.lexer.next_token();
            let decoding_fault = next.kind == TokenKind::Invalid
                && self.encoding_faults.iter().any(|f| f.offset == next.offset);
            match next.kind {
                // reported up front as an encoding fault
                TokenKind::Invalid if decoding_fault => {}
                TokenKind::Invalid => {
                    let message = format!("Unexpected character '{}'", next.text);
                    self.report_at(&next, DiagnosticKind::Scan, message, 101, None);
                }
                TokenKind::UnterminatedComment => {
                    self.report_at(
                        &next,
                        DiagnosticKind::Scan,
                        "Block comment is never closed",
                        102,
                        Some("Close every '/*' with a matching '*/'"),
                    );
                }
                _ => {
                    self.current = std::mem::replace(&mut self.la, next);
                    return;
                }
            }
        }
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.la.kind == kind
    }

    pub(crate) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.la.kind)
    }

    pub(crate) fn la(&self) -> &Token {
        &self.la
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    /// Consume `kind` or record a syntax error. Returns whether it matched.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.syntax_error(format!("Expected {}, found {}", kind, self.la.kind), 201);
            false
        }
    }

    /// True when the lookahead is a key: an identifier or string followed by `:`.
    pub(crate) fn at_key(&mut self) -> bool {
        matches!(self.la.kind, TokenKind::Ident | TokenKind::String | TokenKind::BadString)
            && self.lexer.peek_token().kind == TokenKind::Colon
    }

    /// Optional `,` between entries of a map or array body.
    ///
    /// A missing comma before something that can start the next entry is
    /// reported and parsing carries on in place. Anything else is skipped up
    /// to the next comma, closing bracket or entry start.
    pub(crate) fn weak_separator(&mut self, end: TokenKind, starts: &[TokenKind]) {
        if self.at(TokenKind::Comma) {
            self.bump();
            return;
        }
        if self.at(end) || self.at_any(CLOSERS) || self.at(TokenKind::Eof) {
            return;
        }
        if self.at_any(starts) {
            self.syntax_error(format!("Expected ',' before {}", self.la.kind), 205);
            return;
        }
        self.syntax_error(format!("Expected ',' or {}, found {}", end, self.la.kind), 205);
        while !self.at(TokenKind::Eof)
            && !self.at(TokenKind::Comma)
            && !self.at_any(CLOSERS)
            && !self.at_any(starts)
        {
            self.bump();
        }
        if self.at(TokenKind::Comma) {
            self.bump();
        }
    }

    /// Skip tokens until one in `stop` (or end of input) is the lookahead.
    pub(crate) fn synchronize(&mut self, stop: &[TokenKind]) {
        while !self.at(TokenKind::Eof) && !self.at_any(stop) {
            self.bump();
        }
    }

    /// Skip the construct opening at the lookahead, brackets balanced.
    pub(crate) fn skip_nested(&mut self) {
        let mut open = 0usize;
        loop {
            match self.la.kind {
                TokenKind::LBrace | TokenKind::LBracket => open += 1,
                TokenKind::RBrace | TokenKind::RBracket => open = open.saturating_sub(1),
                TokenKind::Eof => return,
                _ => {}
            }
            self.bump();
            if open == 0 {
                return;
            }
        }
    }

    /// Enter a nested map or array. False means the nesting limit was hit,
    /// an error was recorded and the construct skipped.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= self.options.max_depth {
            let message = format!("Nesting deeper than {} levels", self.options.max_depth);
            let hint = "Flatten the structure or raise ParseOptions::max_depth";
            self.report(DiagnosticKind::Syntax, message, 206, Some(hint));
            self.skip_nested();
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn syntax_error(&mut self, message: impl Into<String>, code: u32) {
        self.report(DiagnosticKind::Syntax, message, code, None);
    }

    pub(crate) fn semantic_error(&mut self, message: impl Into<String>, code: u32) {
        let token = self.current.clone();
        self.report_at(&token, DiagnosticKind::Semantic, message, code, None);
    }

    /// Record a diagnostic at the lookahead position.
    pub(crate) fn report(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        code: u32,
        hint: Option<&str>,
    ) {
        let token = self.la.clone();
        self.report_at(&token, kind, message, code, hint);
    }

    pub(crate) fn report_at(
        &mut self,
        token: &Token,
        kind: DiagnosticKind,
        message: impl Into<String>,
        code: u32,
        hint: Option<&str>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, message, token.line, token.column, code);
        if let Some(hint) = hint {
            diagnostic = diagnostic.with_hint(hint);
        }
        self.record(diagnostic);
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "recorded diagnostic");
        if let Some(sink) = self.sink.as_deref_mut() {
            let _ = writeln!(sink, "{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests;
