use serde::Serialize;

/// Byte range in a module's text, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Compute the position of a byte offset in `text`
    pub fn of(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Self {
            line,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One entry of an `export { ... }` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpecifier {
    /// Name on the local (or source module) side
    pub local: String,
    /// Name visible to importers
    pub exported: String,
    /// Original text of the entry, e.g. `type Foo` or `a as b`
    pub raw: String,
}

/// An export statement found in a module
///
/// Every variant carries the `span` of the statement and a `skip` flag set
/// when the statement is annotated with the skip marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportItem {
    /// `export const a = 1, b = 2`, `export enum E {}`, `export namespace N {}`
    Binding {
        names: Vec<String>,
        span: Span,
        skip: bool,
    },
    /// `export function f() {}`
    Function { name: String, span: Span, skip: bool },
    /// `export interface I {}`
    Interface { name: String, span: Span, skip: bool },
    /// `export type T = ...`
    TypeAlias { name: String, span: Span, skip: bool },
    /// `export default ...`
    Default { span: Span, skip: bool },
    /// `export { a, b as c }`, optionally `from '...'`
    NamedReexport {
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
        /// Range between the braces
        list: Span,
        span: Span,
        skip: bool,
    },
    /// `export * as ns from '...'`
    NamespaceReexport {
        name: String,
        source: String,
        span: Span,
        skip: bool,
    },
    /// `export * from '...'`
    WholeReexport {
        source: String,
        span: Span,
        skip: bool,
    },
    /// `export class C {}`
    Class { name: String, span: Span, skip: bool },
}

impl ExportItem {
    /// Names this item makes visible to importers
    pub fn names(&self) -> Vec<&str> {
        match self {
            ExportItem::Binding { names, .. } => names.iter().map(String::as_str).collect(),
            ExportItem::Function { name, .. }
            | ExportItem::Interface { name, .. }
            | ExportItem::TypeAlias { name, .. }
            | ExportItem::NamespaceReexport { name, .. }
            | ExportItem::Class { name, .. } => vec![name.as_str()],
            ExportItem::Default { .. } => vec![DEFAULT_EXPORT],
            ExportItem::NamedReexport { specifiers, .. } => {
                specifiers.iter().map(|s| s.exported.as_str()).collect()
            }
            ExportItem::WholeReexport { .. } => Vec::new(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ExportItem::Binding { span, .. }
            | ExportItem::Function { span, .. }
            | ExportItem::Interface { span, .. }
            | ExportItem::TypeAlias { span, .. }
            | ExportItem::Default { span, .. }
            | ExportItem::NamedReexport { span, .. }
            | ExportItem::NamespaceReexport { span, .. }
            | ExportItem::WholeReexport { span, .. }
            | ExportItem::Class { span, .. } => *span,
        }
    }

    pub fn skip(&self) -> bool {
        match self {
            ExportItem::Binding { skip, .. }
            | ExportItem::Function { skip, .. }
            | ExportItem::Interface { skip, .. }
            | ExportItem::TypeAlias { skip, .. }
            | ExportItem::Default { skip, .. }
            | ExportItem::NamedReexport { skip, .. }
            | ExportItem::NamespaceReexport { skip, .. }
            | ExportItem::WholeReexport { skip, .. }
            | ExportItem::Class { skip, .. } => *skip,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ExportItem::Binding { .. } => "binding",
            ExportItem::Function { .. } => "function",
            ExportItem::Interface { .. } => "interface",
            ExportItem::TypeAlias { .. } => "type alias",
            ExportItem::Default { .. } => "default export",
            ExportItem::NamedReexport { .. } => "export list",
            ExportItem::NamespaceReexport { .. } => "namespace re-export",
            ExportItem::WholeReexport { .. } => "re-export",
            ExportItem::Class { .. } => "class",
        }
    }
}

/// Name under which a default export is imported
pub const DEFAULT_EXPORT: &str = "default";
