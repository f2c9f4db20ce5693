// Module references: imports, re-exports and dynamic loads

use super::exports::{parse_export, parse_specifiers};
use super::lexer::{top_level_statements, StatementKind};
use crate::analysis::{ExportItem, ExportSpecifier, Span};
use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)^import\s+(type\s+)?(.*?)\s*from\s*(['"])([^'"]+)['"]"#).unwrap()
});
static IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^import\s*(['"])([^'"]+)['"]"#).unwrap());
static NAMESPACE_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\s*as\s+([A-Za-z_$][\w$]*)").unwrap());
static DEFAULT_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_$][\w$]*)\s*(?:,\s*)?").unwrap());
static DYNAMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:import|require)\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap()
});

/// What an import statement binds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportClause {
    pub type_only: bool,
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// `{ ... }` entries; `local` is the imported name, `exported` the binding
    pub named: Vec<ExportSpecifier>,
}

impl ImportClause {
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `import ... from '...'`
    Import(ImportClause),
    /// `import '...'`
    SideEffect,
    /// `import('...')` or `require('...')`
    Dynamic,
    /// `export { ... } from '...'`
    NamedReexport(Vec<ExportSpecifier>),
    /// `export * as ns from '...'`
    NamespaceReexport(String),
    /// `export * from '...'`
    WholeReexport,
}

/// A reference from one module to another, by specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub specifier: String,
    pub kind: ReferenceKind,
    pub span: Span,
    /// Quote character used around the specifier
    pub quote: char,
}

/// Every reference `src` makes to other modules, in source order
pub fn scan_references(src: &str) -> Vec<ModuleReference> {
    let mut references = Vec::new();

    for statement in top_level_statements(src) {
        let reference = match statement.kind {
            StatementKind::Import => parse_import(statement.text(src), statement.span),
            StatementKind::Export => {
                parse_export(src, &statement, "").and_then(|item| reexport_reference(src, item))
            }
        };
        references.extend(reference);
    }

    for caps in DYNAMIC.captures_iter(src) {
        let (Some(whole), Some(specifier)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        references.push(ModuleReference {
            specifier: specifier.as_str().to_string(),
            kind: ReferenceKind::Dynamic,
            span: Span::new(whole.start(), whole.end()),
            quote: quote_at(src, specifier.start()),
        });
    }

    references.sort_by_key(|r| r.span.start);
    references
}

/// Parse a static import statement
pub fn parse_import(text: &str, span: Span) -> Option<ModuleReference> {
    if let Some(caps) = IMPORT_BARE.captures(text) {
        return Some(ModuleReference {
            specifier: caps[2].to_string(),
            kind: ReferenceKind::SideEffect,
            span,
            quote: caps[1].chars().next().unwrap_or('\''),
        });
    }

    let caps = IMPORT_FROM.captures(text)?;
    let mut clause = parse_clause(caps[2].trim())?;
    clause.type_only = caps.get(1).is_some();
    Some(ModuleReference {
        specifier: caps[4].to_string(),
        kind: ReferenceKind::Import(clause),
        span,
        quote: caps[3].chars().next().unwrap_or('\''),
    })
}

fn parse_clause(mut clause: &str) -> Option<ImportClause> {
    let mut parsed = ImportClause::default();

    if !clause.starts_with('{') && !clause.starts_with('*') {
        let caps = DEFAULT_CLAUSE.captures(clause)?;
        parsed.default = Some(caps[1].to_string());
        clause = clause[caps.get(0)?.end()..].trim();
    }

    if let Some(caps) = NAMESPACE_CLAUSE.captures(clause) {
        parsed.namespace = Some(caps[1].to_string());
    } else if let Some(inner) = clause.strip_prefix('{') {
        let close = inner.find('}')?;
        parsed.named = parse_specifiers(&inner[..close]);
    } else if !clause.is_empty() {
        return None;
    }

    Some(parsed)
}

fn reexport_reference(src: &str, item: ExportItem) -> Option<ModuleReference> {
    let (specifier, kind, span) = match item {
        ExportItem::WholeReexport { source, span, .. } => {
            (source, ReferenceKind::WholeReexport, span)
        }
        ExportItem::NamespaceReexport {
            name, source, span, ..
        } => (source, ReferenceKind::NamespaceReexport(name), span),
        ExportItem::NamedReexport {
            specifiers,
            source: Some(source),
            span,
            ..
        } => (source, ReferenceKind::NamedReexport(specifiers), span),
        _ => return None,
    };
    let quote = span
        .slice(src)
        .chars()
        .find(|c| *c == '\'' || *c == '"')
        .unwrap_or('\'');
    Some(ModuleReference {
        specifier,
        kind,
        span,
        quote,
    })
}

fn quote_at(src: &str, specifier_start: usize) -> char {
    src[..specifier_start].chars().next_back().unwrap_or('\'')
}
