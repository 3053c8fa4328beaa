use std::fmt;

use crate::lexer::{is_ident_continue, is_ident_start};

/// Why a string literal could not be unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeError {
    pub message: String,
    /// Byte offset of the offending backslash within the literal.
    pub offset: usize,
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

/// Expand the escapes of a string literal body.
///
/// Recognized: `\b \f \n \r \t \" \\` and `\uXXXX`. A high surrogate must be
/// followed by a `\u` low surrogate.
pub fn unescape(raw: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let offset = raw.len() - rest.len() + pos;
        let after = &rest[pos + 1..];
        let mut chars = after.chars();

        let consumed = match chars.next() {
            Some(c @ ('b' | 'f' | 'n' | 'r' | 't' | '"' | '\\')) => {
                out.push(simple_escape(c));
                1
            }
            Some('u') => {
                let unit = hex_unit(&after[1..]).ok_or_else(|| EscapeError {
                    message: "Expected four hex digits after \\u".into(),
                    offset,
                })?;
                match unit {
                    0xD800..=0xDBFF => {
                        let low = after[5..]
                            .strip_prefix("\\u")
                            .and_then(hex_unit)
                            .filter(|low| (0xDC00..=0xDFFF).contains(low))
                            .ok_or_else(|| EscapeError {
                                message: format!("Unpaired surrogate \\u{:04X}", unit),
                                offset,
                            })?;
                        let high = u32::from(unit) - 0xD800;
                        let code = 0x10000 + (high << 10) + (u32::from(low) - 0xDC00);
                        out.push(char::from_u32(code).ok_or_else(|| EscapeError {
                            message: format!("Invalid code point U+{:X}", code),
                            offset,
                        })?);
                        11
                    }
                    0xDC00..=0xDFFF => {
                        return Err(EscapeError {
                            message: format!("Unpaired surrogate \\u{:04X}", unit),
                            offset,
                        });
                    }
                    _ => {
                        // non-surrogate units are always valid scalar values
                        let c = char::from_u32(u32::from(unit));
                        out.push(c.unwrap_or(char::REPLACEMENT_CHARACTER));
                        5
                    }
                }
            }
            Some(other) => {
                return Err(EscapeError {
                    message: format!("Unknown escape '\\{}'", other),
                    offset,
                });
            }
            None => {
                return Err(EscapeError {
                    message: "Trailing backslash".into(),
                    offset,
                });
            }
        };
        rest = &after[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

fn simple_escape(c: char) -> char {
    match c {
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}

fn hex_unit(s: &str) -> Option<u16> {
    let digits = s.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Quote and escape `s` so that [`unescape`] gives it back.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// True when `s` can be written as a bare key.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}
