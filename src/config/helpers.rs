use crate::lexer::{Lexer, TokenKind};
use crate::utils::unescape;

/// Spellings tried for one path segment: as written, snake_case, kebab-case.
pub(super) fn variants(seg: &str) -> Vec<String> {
    let mut out = vec![seg.to_string()];

    let snake = seg.replace('-', "_");
    if snake != seg {
        out.push(snake);
    }

    let kebab = seg.replace('_', "-");
    if kebab != seg {
        out.push(kebab);
    }
    out
}

fn same_segment(a: &str, b: &str) -> bool {
    a == b || a.replace('-', "_") == b.replace('-', "_")
}

enum Frame {
    Map,
    Array(usize),
}

/// Line (1-based) and trimmed source text where `path` is written, or
/// `(0, "<key not found>")`.
///
/// Map entries are found at their key, array elements at their first token.
pub(super) fn find_config_line(path: &str, raw_content: &str) -> (usize, String) {
    let target: Vec<&str> = if path.is_empty() { Vec::new() } else { path.split('.').collect() };
    let is_target = |scope: &[String], seg: &str| {
        scope.len() + 1 == target.len()
            && scope.iter().zip(&target).all(|(a, b)| same_segment(a, b))
            && target.last().is_some_and(|last| same_segment(seg, last))
    };

    let mut lexer = Lexer::new(raw_content);
    let mut frames = vec![Frame::Map];
    let mut scope: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;

    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::RBrace | TokenKind::RBracket => {
                if frames.len() > 1 {
                    frames.pop();
                    scope.pop();
                }
                pending = None;
                continue;
            }
            TokenKind::Comma | TokenKind::Colon => continue,
            _ => {}
        }

        let segment = match frames.last_mut() {
            Some(Frame::Array(next)) => {
                let seg = next.to_string();
                *next += 1;
                if is_target(&scope, &seg) {
                    return (token.line, source_line(raw_content, token.line));
                }
                seg
            }
            _ => {
                let is_key = matches!(
                    token.kind,
                    TokenKind::Ident | TokenKind::String | TokenKind::BadString
                ) && lexer.peek_token().kind == TokenKind::Colon;
                if is_key {
                    let key = match token.kind {
                        TokenKind::String => unescape(&token.text).unwrap_or(token.text),
                        _ => token.text,
                    };
                    if is_target(&scope, &key) {
                        return (token.line, source_line(raw_content, token.line));
                    }
                    pending = Some(key);
                    continue;
                }
                match pending.take() {
                    Some(key) => key,
                    None => continue,
                }
            }
        };

        match token.kind {
            TokenKind::LBrace => {
                frames.push(Frame::Map);
                scope.push(segment);
            }
            TokenKind::LBracket => {
                frames.push(Frame::Array(0));
                scope.push(segment);
            }
            _ => {}
        }
    }

    (0, "<key not found>".into())
}

fn source_line(raw_content: &str, line: usize) -> String {
    raw_content
        .lines()
        .nth(line.saturating_sub(1))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}
