use std::borrow::Cow;
use std::io::{self, Read};

use super::*;

/// A byte sequence in raw input that is not UTF-8.
///
/// Positions are in the decoded text, where the sequence became one U+FFFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingFault {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Decode raw input bytes, dropping a UTF-8 byte-order mark.
///
/// Invalid sequences become U+FFFD silently. Use [`decode_source_with_faults`]
/// when they must be reported.
pub fn decode_source(bytes: &[u8]) -> Cow<'_, str> {
    decode_source_with_faults(bytes).0
}

/// Like [`decode_source`], also listing where each invalid sequence was.
pub fn decode_source_with_faults(bytes: &[u8]) -> (Cow<'_, str>, Vec<EncodingFault>) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), Vec::new());
    }

    let mut text = String::with_capacity(bytes.len());
    let mut faults = Vec::new();
    let (mut line, mut column) = (1, 1);
    for chunk in bytes.utf8_chunks() {
        advance_position(chunk.valid(), &mut line, &mut column);
        text.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            faults.push(EncodingFault { line, column, offset: text.len() });
            text.push(char::REPLACEMENT_CHARACTER);
            column += 1;
        }
    }
    (Cow::Owned(text), faults)
}

/// Line and column after `text`, counted the way [`bump`] counts them.
fn advance_position(text: &str, line: &mut usize, column: &mut usize) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                *line += 1;
                *column = 1;
            }
            '\r' if chars.peek() != Some(&'\n') => {
                *line += 1;
                *column = 1;
            }
            '\r' => {}
            _ => *column += 1,
        }
    }
}

/// Read a non-seekable source (pipe, socket) into a growable buffer.
///
/// The bytes are returned as read; decode them with [`decode_source`] or
/// [`decode_source_with_faults`].
pub fn read_source<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Peek at the current character without consuming it
pub(super) fn peek_char(lexer: &Lexer) -> Option<char> {
    lexer.source[lexer.pos..].chars().next()
}

/// Peek `n` characters past the current one
pub(super) fn peek_char_at(lexer: &Lexer, n: usize) -> Option<char> {
    lexer.source[lexer.pos..].chars().nth(n)
}

/// Advance one character and update line/column tracking.
///
/// CRLF and a lone CR both count as one newline.
pub(super) fn bump(lexer: &mut Lexer) -> Option<char> {
    let curr = peek_char(lexer)?;
    lexer.pos += curr.len_utf8();
    match curr {
        '\n' => {
            lexer.line += 1;
            lexer.column = 1;
        }
        '\r' if peek_char(lexer) != Some('\n') => {
            lexer.line += 1;
            lexer.column = 1;
        }
        '\r' => {}
        _ => lexer.column += 1,
    }
    Some(curr)
}

pub(super) fn bump_while(lexer: &mut Lexer, pred: impl Fn(char) -> bool) {
    while let Some(c) = peek_char(lexer) {
        if !pred(c) {
            break;
        }
        bump(lexer);
    }
}

/// Where an unterminated block comment started.
pub(super) struct OpenComment {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Skip whitespace, line comments and nested block comments
pub(super) fn skip_whitespace_and_comments(lexer: &mut Lexer) -> Result<(), OpenComment> {
    while let Some(c) = peek_char(lexer) {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                bump(lexer);
            }
            '/' if peek_char_at(lexer, 1) == Some('/') => {
                while let Some(ch) = peek_char(lexer) {
                    if ch == '\n' || ch == '\r' {
                        break;
                    }
                    bump(lexer);
                }
            }
            '/' if peek_char_at(lexer, 1) == Some('*') => skip_block_comment(lexer)?,
            _ => break,
        }
    }
    Ok(())
}

fn skip_block_comment(lexer: &mut Lexer) -> Result<(), OpenComment> {
    let open = OpenComment {
        line: lexer.line,
        column: lexer.column,
        offset: lexer.pos,
    };
    bump(lexer);
    bump(lexer);

    let mut depth = 1usize;
    while depth > 0 {
        match bump(lexer) {
            Some('/') if peek_char(lexer) == Some('*') => {
                bump(lexer);
                depth += 1;
            }
            Some('*') if peek_char(lexer) == Some('/') => {
                bump(lexer);
                depth -= 1;
            }
            Some(_) => {}
            None => return Err(open),
        }
    }
    Ok(())
}
