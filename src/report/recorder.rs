use crate::analysis::RemovedExport;
use crate::engine::EditObserver;
use crate::store::Modules;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Edited,
    Deleted,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Edited => "edited",
            ChangeStatus::Deleted => "deleted",
        }
    }
}

/// Everything that happened to one module during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleChange {
    pub path: String,
    pub status: ChangeStatus,
    pub removed_exports: Vec<RemovedExport>,
}

/// Per-module changes of a run, sorted by path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub modules: Vec<ModuleChange>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn deleted(&self) -> impl Iterator<Item = &ModuleChange> {
        self.modules
            .iter()
            .filter(|m| m.status == ChangeStatus::Deleted)
    }

    pub fn edited(&self) -> impl Iterator<Item = &ModuleChange> {
        self.modules
            .iter()
            .filter(|m| m.status == ChangeStatus::Edited)
    }

    pub fn removed_export_count(&self) -> usize {
        self.modules.iter().map(|m| m.removed_exports.len()).sum()
    }
}

#[derive(Debug, Default)]
struct Entry {
    original: String,
    deleted: bool,
    removed: Vec<RemovedExport>,
}

/// [`EditObserver`] that collects engine events into a [`ChangeReport`]
#[derive(Debug, Default)]
pub struct ChangeRecorder {
    entries: BTreeMap<String, Entry>,
    events: usize,
}

impl ChangeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of start/end cycles observed
    pub fn events(&self) -> usize {
        self.events
    }

    /// Build the report against the final store. Modules that were notified
    /// but end with their original text are left out.
    pub fn into_report(self, final_store: &Modules) -> ChangeReport {
        let modules = self
            .entries
            .into_iter()
            .filter_map(|(path, entry)| {
                let status = if entry.deleted || !final_store.exists(&path) {
                    ChangeStatus::Deleted
                } else if final_store.get(&path) != Some(entry.original.as_str()) {
                    ChangeStatus::Edited
                } else {
                    return None;
                };
                let removed_exports = match status {
                    ChangeStatus::Deleted => Vec::new(),
                    ChangeStatus::Edited => entry.removed,
                };
                Some(ModuleChange {
                    path,
                    status,
                    removed_exports,
                })
            })
            .collect();

        ChangeReport { modules }
    }
}

impl EditObserver for ChangeRecorder {
    fn start(&mut self, path: &str, previous: &str) {
        self.entries
            .entry(path.to_string())
            .or_insert_with(|| Entry {
                original: previous.to_string(),
                ..Entry::default()
            });
    }

    fn delete(&mut self, path: &str) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.deleted = true;
        }
    }

    fn remove_export(&mut self, path: &str, export: &RemovedExport) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.removed.push(export.clone());
        }
    }

    fn end(&mut self, _path: &str) {
        self.events += 1;
    }
}
