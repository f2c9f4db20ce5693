// Export statement recognition

use super::lexer::{statement_head, top_level_statements, Statement, StatementKind};
use crate::analysis::{ExportItem, ExportSpecifier, Span};
use once_cell::sync::Lazy;
use regex::Regex;

const IDENT: &str = r"[A-Za-z_$][\w$]*";

static WHOLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^export\s+\*\s*from\s*['"]([^'"]+)['"]"#).unwrap());
static NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^export\s+\*\s+as\s+({IDENT})\s+from\s*['"]([^'"]+)['"]"#
    ))
    .unwrap()
});
static LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^export\s+(?:type\s+)?\{").unwrap());
static LIST_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*from\s*['"]([^'"]+)['"]"#).unwrap());
static DEFAULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^export\s+default\b").unwrap());
static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^export\s+(?:declare\s+)?(?:async\s+)?function\s*\*?\s*({IDENT})"
    ))
    .unwrap()
});
static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^export\s+(?:declare\s+)?(?:abstract\s+)?class\s+({IDENT})"
    ))
    .unwrap()
});
static INTERFACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^export\s+(?:declare\s+)?interface\s+({IDENT})")).unwrap()
});
static TYPE_ALIAS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^export\s+(?:declare\s+)?type\s+({IDENT})")).unwrap()
});
static ENUM_OR_NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^export\s+(?:declare\s+)?(?:const\s+)?(?:enum|namespace|module)\s+({IDENT})"
    ))
    .unwrap()
});
static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^export\s+(?:declare\s+)?(?:const|let|var|using)\s+").unwrap()
});
static LEADING_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(?:\.\.\.)?\s*({IDENT})")).unwrap());

/// All export statements of a module, in source order
pub fn scan_exports(src: &str, skip_marker: &str) -> Vec<ExportItem> {
    top_level_statements(src)
        .into_iter()
        .filter(|s| s.kind == StatementKind::Export)
        .filter_map(|s| parse_export(src, &s, skip_marker))
        .collect()
}

/// Recognize one export statement. `export =` and `export as namespace`
/// are not tracked and yield `None`.
pub fn parse_export(src: &str, statement: &Statement, skip_marker: &str) -> Option<ExportItem> {
    let span = statement.span;
    let text = statement.text(src);
    let skip = !skip_marker.is_empty() && statement_head(src, span).contains(skip_marker);

    if let Some(caps) = NAMESPACE.captures(text) {
        return Some(ExportItem::NamespaceReexport {
            name: caps[1].to_string(),
            source: caps[2].to_string(),
            span,
            skip,
        });
    }
    if let Some(caps) = WHOLE.captures(text) {
        return Some(ExportItem::WholeReexport {
            source: caps[1].to_string(),
            span,
            skip,
        });
    }
    if let Some(m) = LIST.find(text) {
        let open = m.end() - 1;
        let close = open + text[open..].find('}')?;
        let source = LIST_SOURCE
            .captures(&text[close + 1..])
            .map(|caps| caps[1].to_string());
        return Some(ExportItem::NamedReexport {
            specifiers: parse_specifiers(&text[open + 1..close]),
            source,
            list: Span::new(span.start + open + 1, span.start + close),
            span,
            skip,
        });
    }
    if DEFAULT.is_match(text) {
        return Some(ExportItem::Default { span, skip });
    }
    if let Some(caps) = FUNCTION.captures(text) {
        return Some(ExportItem::Function {
            name: caps[1].to_string(),
            span,
            skip,
        });
    }
    if let Some(caps) = CLASS.captures(text) {
        return Some(ExportItem::Class {
            name: caps[1].to_string(),
            span,
            skip,
        });
    }
    if let Some(caps) = INTERFACE.captures(text) {
        return Some(ExportItem::Interface {
            name: caps[1].to_string(),
            span,
            skip,
        });
    }
    if let Some(caps) = ENUM_OR_NAMESPACE.captures(text) {
        return Some(ExportItem::Binding {
            names: vec![caps[1].to_string()],
            span,
            skip,
        });
    }
    if let Some(caps) = TYPE_ALIAS.captures(text) {
        return Some(ExportItem::TypeAlias {
            name: caps[1].to_string(),
            span,
            skip,
        });
    }
    if let Some(m) = VARIABLE.find(text) {
        let names = declared_names(&text[m.end()..]);
        if names.is_empty() {
            return None;
        }
        return Some(ExportItem::Binding { names, span, skip });
    }

    None
}

/// Parse the inside of `{ ... }` in an export or import list
pub fn parse_specifiers(list: &str) -> Vec<ExportSpecifier> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|raw| {
            let body = raw.strip_prefix("type ").map(str::trim).unwrap_or(raw);
            let mut parts = body.split_whitespace();
            let local = parts.next()?.to_string();
            let exported = match (parts.next(), parts.next()) {
                (Some("as"), Some(alias)) => alias.to_string(),
                _ => local.clone(),
            };
            Some(ExportSpecifier {
                local,
                exported,
                raw: raw.to_string(),
            })
        })
        .collect()
}

/// Names bound by the declarator list of `export const ...`
fn declared_names(declarators: &str) -> Vec<String> {
    split_top_level(declarators, b',')
        .into_iter()
        .flat_map(|decl| binding_names(decl.trim()))
        .collect()
}

fn binding_names(pattern: &str) -> Vec<String> {
    let pattern = pattern.trim();
    if let Some(open @ (b'{' | b'[')) = pattern.bytes().next() {
        let close = if open == b'{' { b'}' } else { b']' };
        let Some(end) = matching_close(pattern, open, close) else {
            return Vec::new();
        };
        return split_top_level(&pattern[1..end], b',')
            .into_iter()
            .flat_map(|element| {
                let element = element.trim();
                // `key: pattern` binds the pattern, `key = default` binds the key
                match top_level_position(element, b':') {
                    Some(colon) if open == b'{' => binding_names(&element[colon + 1..]),
                    _ => binding_names(element),
                }
            })
            .collect();
    }

    let Some(caps) = LEADING_IDENT.captures(pattern) else {
        return Vec::new();
    };
    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let rest = pattern[caps.get(0).map(|m| m.end()).unwrap_or(0)..].trim_start();
    // Anything else is a fragment of a type annotation or initializer
    match rest.bytes().next() {
        None | Some(b'=' | b':' | b'!' | b';') => vec![name.to_string()],
        _ => Vec::new(),
    }
}

/// Split at `sep` where no bracket, string or template is open. Stops at a
/// top-level `;`.
fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 1;
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' | b'`' => quote = Some(c),
            b'{' | b'(' | b'[' | b'<' => depth += 1,
            b'}' | b')' | b']' | b'>' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => break,
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start..i.min(text.len())]);
    parts
}

fn top_level_position(text: &str, needle: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.bytes().enumerate() {
        match c {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            _ if c == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn matching_close(text: &str, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.bytes().enumerate() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}
