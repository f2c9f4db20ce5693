//! ES module backend
//!
//! A lightweight, regex-and-scanner based understanding of JavaScript and
//! TypeScript modules: enough to find top-level import and export statements,
//! resolve relative specifiers, and cut statements out of the text.

mod cleanup;
mod exports;
mod imports;
mod lexer;
mod resolve;
mod usage;

pub use cleanup::{is_referenced, prune_unused_imports, remove_whole_reexport};
pub use exports::scan_exports;
pub use imports::{scan_references, ImportClause, ModuleReference, ReferenceKind};
pub use lexer::{top_level_statements, Statement, StatementKind};
pub use resolve::{resolve, EXTENSIONS};
pub use usage::UsageResolver;

use crate::analysis::{
    plan_removals, AnalysisRequest, AnalysisResult, Analyzer, AnalyzerError, ExportItem,
    ModulePolicy, Plan, Position, Removal, RemovedExport, Span,
};
use crate::engine::DEFAULT_SKIP_MARKER;
use crate::graph::{EdgeExtractor, ImportEdge};
use crate::refactor::{TextEdit, TextEditor};
use crate::store::StoreSnapshot;
use cleanup::is_referenced_outside;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, trace};

static EXPORT_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^export\s+(?:default\s+)?").unwrap());
static NAMED_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^export\s+default\s+(?:abstract\s+)?(?:async\s+)?(?:function\s*\*?|class)\s*([A-Za-z_$][\w$]*)",
    )
    .unwrap()
});

/// Builds import edges from static imports, re-exports and dynamic loads
#[derive(Debug, Default, Clone, Copy)]
pub struct EsEdgeExtractor;

impl EdgeExtractor for EsEdgeExtractor {
    fn extract(&self, store: &StoreSnapshot, _entrypoints: &[String]) -> Vec<ImportEdge> {
        let modules: Vec<(&str, &str)> = store.iter().collect();

        let mut edges: Vec<ImportEdge> = modules
            .par_iter()
            .flat_map_iter(|(path, text)| {
                scan_references(text).into_iter().filter_map(move |reference| {
                    let Some(target) = resolve(path, &reference.specifier, store) else {
                        trace!("Unresolved specifier '{}' in {}", reference.specifier, path);
                        return None;
                    };
                    Some(match reference.kind {
                        ReferenceKind::WholeReexport => {
                            ImportEdge::whole_reexport(*path, target, reference.specifier)
                        }
                        _ => ImportEdge::new(*path, target),
                    })
                })
            })
            .collect();

        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        debug!("Extracted {} import edges from {} modules", edges.len(), modules.len());
        edges
    }
}

/// [`Analyzer`] for ES modules
#[derive(Debug, Clone)]
pub struct EsAnalyzer {
    skip_marker: String,
}

impl EsAnalyzer {
    pub fn new(skip_marker: impl Into<String>) -> Self {
        Self {
            skip_marker: skip_marker.into(),
        }
    }

    fn module_skipped(&self, text: &str) -> bool {
        !self.skip_marker.is_empty() && text.contains(self.skip_marker.as_str())
    }

    fn apply_removals(
        &self,
        path: &str,
        text: &str,
        exports: &[ExportItem],
        removals: &[Removal],
    ) -> Result<AnalysisResult, AnalyzerError> {
        let mut edits = Vec::new();
        let mut removed = Vec::new();

        for removal in removals {
            let item = &exports[removal.item()];
            let position = Position::of(text, item.span().start);
            removed.extend(
                removal
                    .symbols(exports)
                    .into_iter()
                    .map(|symbol| RemovedExport::new(symbol, position)),
            );

            match removal {
                Removal::Item(_) => edits.push(removal_edit(text, item)),
                Removal::Specifiers { indices, .. } => {
                    let ExportItem::NamedReexport {
                        specifiers, list, ..
                    } = item
                    else {
                        return Err(AnalyzerError::InvalidEdit {
                            path: path.to_string(),
                            reason: format!("specifier removal on a {}", item.kind_name()),
                        });
                    };
                    let kept: Vec<&str> = specifiers
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !indices.contains(i))
                        .map(|(_, s)| s.raw.as_str())
                        .collect();
                    edits.push(TextEdit::replace(*list, format!(" {} ", kept.join(", "))));
                }
            }
        }

        let content = TextEditor::apply(text, edits).map_err(|e| AnalyzerError::InvalidEdit {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(AnalysisResult::Edit { content, removed })
    }
}

impl Default for EsAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_MARKER)
    }
}

impl Analyzer for EsAnalyzer {
    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalyzerError> {
        let path = request.path;
        let text = request
            .store
            .get(path)
            .ok_or_else(|| AnalyzerError::MissingModule(path.to_string()))?;
        if request.graph.is_entrypoint(path) {
            return Ok(AnalysisResult::unchanged(text));
        }

        let exports = scan_exports(text, &self.skip_marker);
        let mut usage = UsageResolver::new(request.graph, request.store).usage_of(path);
        // Names forwarded through `export *` may belong to sibling modules.
        // Without a whole re-export of its own, only this module's names count.
        if !exports
            .iter()
            .any(|item| matches!(item, ExportItem::WholeReexport { .. }))
        {
            usage.narrow_forwarded(|name| exports.iter().any(|item| item.names().contains(&name)));
        }
        let policy = ModulePolicy {
            allow_delete: request.allow_delete,
            module_skipped: self.module_skipped(text),
        };

        match plan_removals(&exports, &usage, policy) {
            Plan::Keep => Ok(AnalysisResult::unchanged(text)),
            Plan::DeleteModule => Ok(AnalysisResult::Delete),
            Plan::Remove(removals) => self.apply_removals(path, text, &exports, &removals),
        }
    }

    fn remove_whole_reexport(&self, text: &str, specifier: &str) -> Option<String> {
        remove_whole_reexport(text, specifier)
    }

    fn cleanup(&self, _path: &str, text: &str) -> Option<String> {
        prune_unused_imports(text)
    }
}

/// Edit that removes an export statement. A declaration still referenced
/// elsewhere in the module only loses its `export` keyword.
fn removal_edit(text: &str, item: &ExportItem) -> TextEdit {
    let span = item.span();
    let local_names: Vec<&str> = match item {
        ExportItem::Binding { .. }
        | ExportItem::Function { .. }
        | ExportItem::Interface { .. }
        | ExportItem::TypeAlias { .. }
        | ExportItem::Class { .. } => item.names(),
        ExportItem::Default { .. } => NAMED_DEFAULT
            .captures(span.slice(text))
            .and_then(|caps| caps.get(1))
            .map(|m| vec![m.as_str()])
            .unwrap_or_default(),
        ExportItem::NamedReexport { .. }
        | ExportItem::NamespaceReexport { .. }
        | ExportItem::WholeReexport { .. } => Vec::new(),
    };

    let still_used = local_names
        .iter()
        .any(|name| is_referenced_outside(text, span, name));
    if still_used {
        if let Some(keyword) = EXPORT_KEYWORD.find(span.slice(text)) {
            return TextEdit::remove(Span::new(span.start, span.start + keyword.end()));
        }
    }

    TextEdit::remove(lexer::removal_range(text, span))
}
