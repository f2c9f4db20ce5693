// Export usage of a module, collected from its live importers

use super::imports::{scan_references, ModuleReference, ReferenceKind};
use super::resolve::resolve;
use crate::analysis::{Usage, DEFAULT_EXPORT};
use crate::graph::ModuleGraph;
use crate::store::Modules;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Computes [`Usage`] from one consistent graph and store snapshot.
///
/// Parsed references are cached per importer for the resolver's lifetime, so
/// a resolver must not outlive the snapshot it was built from.
pub struct UsageResolver<'r> {
    graph: &'r ModuleGraph,
    store: &'r Modules,
    references: HashMap<String, Vec<ModuleReference>>,
}

impl<'r> UsageResolver<'r> {
    pub fn new(graph: &'r ModuleGraph, store: &'r Modules) -> Self {
        Self {
            graph,
            store,
            references: HashMap::new(),
        }
    }

    /// Usage of `target`'s exports across all of its importers
    pub fn usage_of(&mut self, target: &str) -> Usage {
        let mut visiting = HashSet::new();
        self.compute(target, &mut visiting)
    }

    fn compute(&mut self, target: &str, visiting: &mut HashSet<String>) -> Usage {
        // A re-export cycle gives no answer; keep everything on it
        if !visiting.insert(target.to_string()) {
            trace!("Re-export cycle through {}", target);
            return Usage::Wildcard;
        }

        let mut usage = Usage::none();
        'importers: for importer in self.graph.importers(target) {
            for kind in self.references_to(&importer, target) {
                match kind {
                    ReferenceKind::Import(clause) => {
                        if clause.namespace.is_some() {
                            usage.mark_wildcard();
                        }
                        if clause.default.is_some() {
                            usage.mark_used(DEFAULT_EXPORT);
                        }
                        for specifier in clause.named.iter() {
                            usage.mark_used(specifier.local.as_str());
                        }
                        if clause.is_empty() {
                            usage.mark_side_effect();
                        }
                    }
                    ReferenceKind::SideEffect => usage.mark_side_effect(),
                    ReferenceKind::Dynamic => usage.mark_wildcard(),
                    ReferenceKind::NamedReexport(specifiers) => {
                        for specifier in specifiers {
                            usage.mark_used(specifier.local);
                        }
                    }
                    ReferenceKind::NamespaceReexport(name) => {
                        if self.graph.is_entrypoint(&importer)
                            || self.compute(&importer, visiting).keeps(&name)
                        {
                            usage.mark_wildcard();
                        }
                    }
                    ReferenceKind::WholeReexport => {
                        if self.graph.is_entrypoint(&importer) {
                            usage.mark_wildcard();
                        } else {
                            match self.compute(&importer, visiting) {
                                Usage::Wildcard => usage.mark_wildcard(),
                                upstream => {
                                    // `export *` never forwards the default export
                                    for name in upstream.used().filter(|n| *n != DEFAULT_EXPORT) {
                                        usage.mark_forwarded(name);
                                    }
                                }
                            }
                        }
                    }
                }

                if usage.is_wildcard() {
                    break 'importers;
                }
            }
        }

        visiting.remove(target);
        usage
    }

    /// References in `importer` that resolve to `target`
    fn references_to(&mut self, importer: &str, target: &str) -> Vec<ReferenceKind> {
        let store = self.store;
        let references = self
            .references
            .entry(importer.to_string())
            .or_insert_with(|| store.get(importer).map(scan_references).unwrap_or_default());

        references
            .iter()
            .filter(|r| resolve(importer, &r.specifier, store).as_deref() == Some(target))
            .map(|r| r.kind.clone())
            .collect()
    }
}
