// Statement-level rewrites outside the main analysis

use super::exports::parse_export;
use super::imports::{parse_import, ImportClause, ReferenceKind};
use super::lexer::{removal_range, top_level_statements, StatementKind};
use crate::analysis::{ExportItem, Span};
use crate::refactor::{TextEdit, TextEditor};

/// Remove the `export * from '<specifier>'` statement, if present
pub fn remove_whole_reexport(text: &str, specifier: &str) -> Option<String> {
    let statement = top_level_statements(text)
        .into_iter()
        .filter(|s| s.kind == StatementKind::Export)
        .find(|s| {
            matches!(
                parse_export(text, s, ""),
                Some(ExportItem::WholeReexport { source, .. }) if source == specifier
            )
        })?;

    let range = removal_range(text, statement.span);
    TextEditor::remove_range(text, range.start, range.end).ok()
}

/// Drop import bindings the module no longer references, and import
/// statements left with no bindings. Side-effect imports are kept.
pub fn prune_unused_imports(text: &str) -> Option<String> {
    let imports: Vec<_> = top_level_statements(text)
        .into_iter()
        .filter(|s| s.kind == StatementKind::Import)
        .filter_map(|s| parse_import(s.text(text), s.span))
        .collect();
    if imports.is_empty() {
        return None;
    }

    let body = TextEditor::apply(
        text,
        imports.iter().map(|r| TextEdit::remove(r.span)).collect(),
    )
    .ok()?;
    let referenced = |name: &String| is_referenced(&body, name);

    let mut edits = Vec::new();
    for reference in &imports {
        let ReferenceKind::Import(clause) = &reference.kind else {
            continue;
        };
        if clause.is_empty() {
            continue;
        }

        let pruned = ImportClause {
            type_only: clause.type_only,
            default: clause.default.clone().filter(referenced),
            namespace: clause.namespace.clone().filter(referenced),
            named: clause
                .named
                .iter()
                .filter(|s| referenced(&s.exported))
                .cloned()
                .collect(),
        };
        if pruned == *clause {
            continue;
        }

        if pruned.is_empty() {
            edits.push(TextEdit::remove(removal_range(text, reference.span)));
        } else {
            let original = reference.span.slice(text);
            let tail = &original[original.trim_end().len()..];
            let rendered = format!(
                "{}{}",
                render_import(&pruned, &reference.specifier, reference.quote),
                tail
            );
            edits.push(TextEdit::replace(reference.span, rendered));
        }
    }

    if edits.is_empty() {
        return None;
    }
    TextEditor::apply(text, edits).ok()
}

fn render_import(clause: &ImportClause, specifier: &str, quote: char) -> String {
    let mut parts = Vec::new();
    if let Some(default) = &clause.default {
        parts.push(default.clone());
    }
    if let Some(namespace) = &clause.namespace {
        parts.push(format!("* as {}", namespace));
    }
    if !clause.named.is_empty() {
        let named: Vec<&str> = clause.named.iter().map(|s| s.raw.as_str()).collect();
        parts.push(format!("{{ {} }}", named.join(", ")));
    }

    format!(
        "import {}{} from {q}{}{q};",
        if clause.type_only { "type " } else { "" },
        parts.join(", "),
        specifier,
        q = quote
    )
}

/// Whether `name` occurs in `text` as a whole identifier
pub fn is_referenced(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let bytes = text.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';

    text.match_indices(name).any(|(start, _)| {
        let end = start + name.len();
        let before_ok = start == 0 || !is_ident(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident(bytes[end]);
        before_ok && after_ok
    })
}

/// Whether `name` is referenced in `text` outside `span`
pub fn is_referenced_outside(text: &str, span: Span, name: &str) -> bool {
    is_referenced(&text[..span.start], name) || is_referenced(&text[span.end..], name)
}
