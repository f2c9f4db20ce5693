// Top-level statement scanner
//
// Not a parser: it only tracks bracket depth, strings and comments well enough
// to find where top-level `import`/`export` statements start and end.

use crate::analysis::Span;
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\b|class\b|interface\b|enum\b|const\s+enum\b|namespace\b|module\b)",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Import,
    Export,
}

/// A top-level `import` or `export` statement.
///
/// `span` runs from the keyword through the end of the statement, including
/// a trailing line comment and the newline when the statement ends its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn text<'t>(&self, src: &'t str) -> &'t str {
        self.span.slice(src)
    }
}

/// Find all top-level import and export statements in `src`
pub fn top_level_statements(src: &str) -> Vec<Statement> {
    let bytes = src.as_bytes();
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut line_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'\n' => {
                line_start = true;
                i += 1;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b';' if depth == 0 => {
                line_start = true;
                i += 1;
            }
            b'/' if peek(bytes, i + 1) == Some(b'/') => i = skip_line_comment(bytes, i),
            b'/' if peek(bytes, i + 1) == Some(b'*') => i = skip_block_comment(bytes, i),
            b'\'' | b'"' | b'`' => {
                i = skip_string(bytes, i);
                line_start = false;
            }
            _ => {
                if depth == 0 && line_start {
                    if let Some(kind) = statement_kind(bytes, i) {
                        let block = kind == StatementKind::Export && BLOCK_STATEMENT.is_match(&src[i..]);
                        let end = statement_end(bytes, i, block);
                        statements.push(Statement {
                            kind,
                            span: Span::new(i, end),
                        });
                        // Another statement may follow on the same line
                        line_start = true;
                        i = end;
                        continue;
                    }
                }
                match c {
                    b'{' | b'(' | b'[' => depth += 1,
                    b'}' | b')' | b']' => depth = depth.saturating_sub(1),
                    _ => {}
                }
                line_start = false;
                i += 1;
            }
        }
    }

    statements
}

/// Extend a statement span backwards over indentation and the comment lines
/// directly above it, so removing it does not leave an orphaned doc comment.
pub fn removal_range(src: &str, span: Span) -> Span {
    let mut start = line_start_of(src, span.start);
    if !src[start..span.start].trim().is_empty() {
        return span;
    }

    while start > 0 {
        let prev_start = line_start_of(src, start - 1);
        let line = src[prev_start..start].trim();
        let is_comment = line.starts_with("//")
            || line.starts_with("/*")
            || line.starts_with('*')
            || line.ends_with("*/");
        if line.is_empty() || !is_comment {
            break;
        }
        start = prev_start;
    }

    Span::new(start, span.end)
}

/// Text from the leading comment block through the end of the statement's first line
pub fn statement_head<'t>(src: &'t str, span: Span) -> &'t str {
    let range = removal_range(src, span);
    let first_line_end = src[span.start..span.end]
        .find('\n')
        .map(|i| span.start + i)
        .unwrap_or(span.end);
    &src[range.start..first_line_end]
}

fn line_start_of(src: &str, offset: usize) -> usize {
    src[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn statement_kind(bytes: &[u8], i: usize) -> Option<StatementKind> {
    if is_keyword_at(bytes, i, b"export") {
        return Some(StatementKind::Export);
    }
    if is_keyword_at(bytes, i, b"import") {
        // `import(...)` and `import.meta` are expressions
        let next = skip_inline_whitespace(bytes, i + 6);
        return match peek(bytes, next) {
            Some(b'(') | Some(b'.') => None,
            _ => Some(StatementKind::Import),
        };
    }
    None
}

fn statement_end(bytes: &[u8], start: usize, block: bool) -> usize {
    let mut depth = 0usize;
    let mut last: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'/' if peek(bytes, i + 1) == Some(b'/') => {
                i = skip_line_comment(bytes, i);
                continue;
            }
            b'/' if peek(bytes, i + 1) == Some(b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            b'\'' | b'"' | b'`' => {
                i = skip_string(bytes, i);
                last = Some(c);
                continue;
            }
            b';' if depth == 0 => return line_tail(bytes, i + 1),
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => {
                depth = depth.saturating_sub(1);
                if block && depth == 0 && c == b'}' {
                    let next = skip_inline_whitespace(bytes, i + 1);
                    if peek(bytes, next) == Some(b';') {
                        return line_tail(bytes, next + 1);
                    }
                    return line_tail(bytes, i + 1);
                }
            }
            b'\n' if depth == 0 && !block => {
                if !continues_expression(last) && !next_line_continues(bytes, i + 1) {
                    return i + 1;
                }
            }
            _ => {}
        }
        if !c.is_ascii_whitespace() {
            last = Some(c);
        }
        i += 1;
    }

    bytes.len()
}

/// A statement whose last token is one of these continues on the next line
fn continues_expression(last: Option<u8>) -> bool {
    matches!(
        last,
        Some(b'=' | b',' | b'+' | b'-' | b'*' | b'/' | b'?' | b':' | b'.' | b'|' | b'&' | b'(' | b'[' | b'{')
    )
}

fn next_line_continues(bytes: &[u8], i: usize) -> bool {
    let j = skip_inline_whitespace(bytes, i);
    matches!(peek(bytes, j), Some(b'.' | b'?' | b':' | b'|' | b'&' | b'='))
}

/// Consume trailing blanks, a line comment and the newline after a statement.
/// When more code follows on the line, only the blanks are consumed.
fn line_tail(bytes: &[u8], i: usize) -> usize {
    let j = skip_inline_whitespace(bytes, i);
    if peek(bytes, j) == Some(b'/') && peek(bytes, j + 1) == Some(b'/') {
        let k = skip_line_comment(bytes, j);
        return if peek(bytes, k) == Some(b'\n') { k + 1 } else { k };
    }
    match peek(bytes, j) {
        Some(b'\n') => j + 1,
        Some(b'\r') if peek(bytes, j + 1) == Some(b'\n') => j + 2,
        _ => j,
    }
}

fn peek(bytes: &[u8], i: usize) -> Option<u8> {
    bytes.get(i).copied()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_keyword_at(bytes: &[u8], i: usize, keyword: &[u8]) -> bool {
    bytes[i..].starts_with(keyword)
        && (i == 0 || !is_ident_byte(bytes[i - 1]))
        && !peek(bytes, i + keyword.len()).is_some_and(is_ident_byte)
}

fn skip_inline_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while matches!(peek(bytes, i), Some(b' ' | b'\t')) {
        i += 1;
    }
    i
}

/// Returns the index of the terminating newline (or end of input)
fn skip_line_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(bytes: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while j + 1 < bytes.len() {
        if bytes[j] == b'*' && bytes[j + 1] == b'/' {
            return j + 2;
        }
        j += 1;
    }
    bytes.len()
}

/// `bytes[i]` is the opening quote. Returns the index after the closing quote
fn skip_string(bytes: &[u8], i: usize) -> usize {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' if quote != b'`' => return j,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}
