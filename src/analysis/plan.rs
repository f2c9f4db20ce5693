// Decides what to remove from a module given its exports and their usage

use super::{ExportItem, Usage};

/// A single removal within a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// Remove the whole statement at this index
    Item(usize),
    /// Remove some entries of an `export { ... }` list
    Specifiers { item: usize, indices: Vec<usize> },
}

impl Removal {
    /// Exported names that disappear with this removal
    pub fn symbols(&self, exports: &[ExportItem]) -> Vec<String> {
        match self {
            Removal::Item(index) => exports[*index]
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            Removal::Specifiers { item, indices } => match &exports[*item] {
                ExportItem::NamedReexport { specifiers, .. } => indices
                    .iter()
                    .map(|&i| specifiers[i].exported.clone())
                    .collect(),
                _ => Vec::new(),
            },
        }
    }

    pub fn item(&self) -> usize {
        match self {
            Removal::Item(index) => *index,
            Removal::Specifiers { item, .. } => *item,
        }
    }
}

/// Outcome of planning for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Keep,
    DeleteModule,
    Remove(Vec<Removal>),
}

/// Module-level switches for planning
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulePolicy {
    /// Whether a fully unused module may be deleted
    pub allow_delete: bool,
    /// The module text carries the skip marker somewhere
    pub module_skipped: bool,
}

/// Plan removals for a module.
///
/// A wildcard usage keeps the module untouched. A module nobody uses (not
/// even for side effects) is deleted when the policy allows it and nothing in
/// it is skip-marked. Otherwise each export is checked on its own.
pub fn plan_removals(exports: &[ExportItem], usage: &Usage, policy: ModulePolicy) -> Plan {
    if usage.is_wildcard() {
        return Plan::Keep;
    }

    let any_skipped = policy.module_skipped || exports.iter().any(ExportItem::skip);
    if policy.allow_delete && !any_skipped && usage.is_unused() {
        return Plan::DeleteModule;
    }

    let all_unused = |names: &[&str]| !names.is_empty() && names.iter().all(|n| !usage.keeps(n));

    let mut removals = Vec::new();
    for (index, item) in exports.iter().enumerate() {
        if item.skip() {
            continue;
        }
        match item {
            ExportItem::Binding { .. }
            | ExportItem::Function { .. }
            | ExportItem::Interface { .. }
            | ExportItem::TypeAlias { .. }
            | ExportItem::Default { .. }
            | ExportItem::NamespaceReexport { .. }
            | ExportItem::Class { .. } => {
                if all_unused(&item.names()) {
                    removals.push(Removal::Item(index));
                }
            }
            ExportItem::NamedReexport { specifiers, .. } => {
                let unused: Vec<usize> = specifiers
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| !usage.keeps(&s.exported))
                    .map(|(i, _)| i)
                    .collect();
                if unused.is_empty() {
                    continue;
                }
                if unused.len() == specifiers.len() {
                    removals.push(Removal::Item(index));
                } else {
                    removals.push(Removal::Specifiers {
                        item: index,
                        indices: unused,
                    });
                }
            }
            // Which names flow through `export *` is unknown here; these are
            // only dropped once their target module is deleted.
            ExportItem::WholeReexport { .. } => {}
        }
    }

    if removals.is_empty() {
        Plan::Keep
    } else {
        Plan::Remove(removals)
    }
}
