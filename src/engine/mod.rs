//! Fixpoint engine
//!
//! Seeds one task per non-entrypoint module, runs the analyzer over them with
//! [`TaskScheduler`], applies each result to the store and graph, re-enqueues
//! modules whose usage may have changed, and finally removes `export *`
//! statements that point at deleted modules. With secondary cleanup on, the
//! modules it prunes send their importees through another round.

mod error;
mod observer;
mod scheduler;
mod task;

pub use error::EngineError;
pub use observer::{EditObserver, NoopObserver};
pub use scheduler::{Job, SchedulerStats, TaskHandler, TaskScheduler};
pub use task::{sort_by_depth, Task};

use crate::analysis::{AnalysisRequest, AnalysisResult, Analyzer, AnalyzerError};
use crate::graph::{DependencyGraph, EdgeExtractor};
use crate::store::ModuleStore;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Marker that protects an export, or a module outside the graph, from removal
pub const DEFAULT_SKIP_MARKER: &str = "deadexport-skip";

/// Run configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Modules whose exports are public API; never analyzed or deleted
    pub entrypoints: Vec<String>,
    /// Delete modules that are unreachable or entirely unused
    pub delete_unused_modules: bool,
    /// Run the analyzer's secondary cleanup over edited modules
    pub secondary_cleanup: bool,
    /// Re-analyze importees after a module is edited or deleted
    pub cascade: bool,
    /// Worker threads; 0 or 1 runs sequentially
    pub concurrency: usize,
    pub skip_marker: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            entrypoints: Vec::new(),
            delete_unused_modules: true,
            secondary_cleanup: false,
            cascade: true,
            concurrency: 0,
            skip_marker: DEFAULT_SKIP_MARKER.to_string(),
        }
    }
}

/// What a run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub deleted: BTreeSet<String>,
    pub edited: BTreeSet<String>,
    pub removed_exports: usize,
    /// `export *` statements removed after their target was deleted
    pub reexports_cleaned: usize,
    /// Modules changed by the secondary cleanup pass
    pub cleaned_up: BTreeSet<String>,
    pub scheduler: SchedulerStats,
}

impl RunSummary {
    /// True if the run did not touch any module
    pub fn is_unchanged(&self) -> bool {
        self.deleted.is_empty()
            && self.edited.is_empty()
            && self.reexports_cleaned == 0
            && self.cleaned_up.is_empty()
    }
}

/// Final state of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub store: ModuleStore,
    pub graph: DependencyGraph,
    pub summary: RunSummary,
}

/// The orchestrator
pub struct Engine<'a, A, E> {
    analyzer: &'a A,
    extractor: &'a E,
    options: EngineOptions,
}

impl<'a, A, E> Engine<'a, A, E>
where
    A: Analyzer,
    E: EdgeExtractor,
{
    pub fn new(analyzer: &'a A, extractor: &'a E, options: EngineOptions) -> Self {
        Self {
            analyzer,
            extractor,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run to fixpoint over `store`
    pub fn run<O>(&self, store: ModuleStore, observer: &mut O) -> Result<RunOutcome, EngineError>
    where
        O: EditObserver + ?Sized,
    {
        let options = &self.options;
        if options.entrypoints.is_empty() {
            return Err(EngineError::NoEntrypoints);
        }
        if let Some(missing) = options.entrypoints.iter().find(|e| !store.exists(e)) {
            return Err(EngineError::MissingEntrypoint(missing.clone()));
        }

        let edges = self.extractor.extract(&store.snapshot(), &options.entrypoints);
        let graph = DependencyGraph::build(store.list_paths(), &options.entrypoints, &edges);
        info!(
            "Dependency graph: {} modules, {} import edges",
            graph.len(),
            graph.edge_count()
        );

        let mut session = Session {
            analyzer: self.analyzer,
            options,
            entrypoints: options.entrypoints.iter().cloned().collect(),
            store,
            graph,
            observer,
            reexport_cleanup: Vec::new(),
            summary: RunSummary::default(),
        };

        let mut tasks = session.seed();
        info!("Seeded {} modules for analysis", tasks.len());

        let mut round = 1;
        loop {
            let scheduler = TaskScheduler::with_tasks(options.concurrency, tasks);
            let stats = scheduler.run(&mut session)?;
            session.summary.scheduler.merge(stats);

            session.clean_whole_reexports();
            if !options.secondary_cleanup {
                break;
            }
            // Pruned imports can leave importees unused
            tasks = session.secondary_cleanup();
            if tasks.is_empty() {
                break;
            }
            round += 1;
            debug!(
                "Cleanup round {}: re-checking {} modules",
                round,
                tasks.len()
            );
        }

        let Session {
            store,
            graph,
            summary,
            ..
        } = session;

        info!(
            "Fixpoint reached: {} modules deleted, {} edited, {} exports removed",
            summary.deleted.len(),
            summary.edited.len(),
            summary.removed_exports
        );

        Ok(RunOutcome {
            store,
            graph,
            summary,
        })
    }
}

/// Mutable state of one run. Only touched on the scheduler's own thread
struct Session<'a, 'o, A, O: ?Sized> {
    analyzer: &'a A,
    options: &'a EngineOptions,
    entrypoints: HashSet<String>,
    store: ModuleStore,
    graph: DependencyGraph,
    observer: &'o mut O,
    /// `(importer, specifier)` of `export *` statements whose target was deleted
    reexport_cleanup: Vec<(String, String)>,
    summary: RunSummary,
}

impl<'a, 'o, A, O> Session<'a, 'o, A, O>
where
    A: Analyzer,
    O: EditObserver + ?Sized,
{
    /// Build the initial task list, deleting unreachable modules on the way
    /// when allowed.
    ///
    /// A single unreachable module carrying the skip marker turns off
    /// unreachable deletion for the whole run.
    fn seed(&mut self) -> Vec<Task> {
        let (reachable, unreachable): (Vec<String>, Vec<String>) = self
            .store
            .list_paths()
            .into_iter()
            .filter(|path| !self.entrypoints.contains(path))
            .partition(|path| self.graph.depth(path).flatten().is_some());

        let mut delete_unreachable = self.options.delete_unused_modules;
        if delete_unreachable {
            if let Some(marked) = unreachable.iter().find(|path| self.has_skip_marker(path)) {
                info!(
                    "{} carries the skip marker; keeping all unreachable modules",
                    marked
                );
                delete_unreachable = false;
            }
        }

        let mut tasks: Vec<Task> = reachable
            .into_iter()
            .map(|path| {
                let depth = self.graph.depth(&path).flatten();
                Task::new(path, depth)
            })
            .collect();

        for path in unreachable {
            if delete_unreachable {
                debug!("Deleting unreachable module {}", path);
                self.delete_module(&path);
            } else {
                tasks.push(Task::new(path, None));
            }
        }

        sort_by_depth(&mut tasks);
        tasks
    }

    fn has_skip_marker(&self, path: &str) -> bool {
        if self.options.skip_marker.is_empty() {
            return false;
        }
        self.store
            .get(path)
            .map(|text| text.contains(self.options.skip_marker.as_str()))
            .unwrap_or(false)
    }

    /// Remove a module from store and graph. Returns the modules it imported
    fn delete_module(&mut self, path: &str) -> BTreeSet<String> {
        let Some(vertex) = self.graph.vertex(path) else {
            return BTreeSet::new();
        };

        for importer in &vertex.from {
            if let Some(specifier) = self.graph.whole_reexport_specifier(importer, path) {
                self.reexport_cleanup
                    .push((importer.clone(), specifier.to_string()));
            }
        }

        let previous = self.store.get(path).unwrap_or_default().to_string();
        self.observer.start(path, &previous);
        self.observer.delete(path);
        self.store.delete(path);
        self.graph.delete_vertex(path);
        self.observer.end(path);

        self.summary.edited.remove(path);
        self.summary.deleted.insert(path.to_string());
        vertex.to
    }

    /// Tasks for importees that may have lost usage
    fn cascade(&self, importees: BTreeSet<String>) -> Vec<Task> {
        if !self.options.cascade {
            return Vec::new();
        }
        self.recheck(importees)
    }

    fn recheck(&self, importees: BTreeSet<String>) -> Vec<Task> {
        importees
            .into_iter()
            .filter(|path| !self.entrypoints.contains(path) && self.store.exists(path))
            .map(|path| {
                let depth = self.graph.depth(&path).flatten();
                Task::new(path, depth)
            })
            .collect()
    }

    fn apply_result(&mut self, path: &str, result: AnalysisResult) -> Vec<Task> {
        match result {
            AnalysisResult::Delete => {
                if self.entrypoints.contains(path) {
                    debug!("Keeping entrypoint {} despite delete verdict", path);
                    let previous = self.store.get(path).unwrap_or_default().to_string();
                    self.observer.start(path, &previous);
                    self.observer.end(path);
                    return Vec::new();
                }

                debug!("Deleting unused module {}", path);
                let importees = self.delete_module(path);
                self.cascade(importees)
            }
            AnalysisResult::Edit { content, removed } => {
                let Some(previous) = self.store.get(path) else {
                    return Vec::new();
                };
                if removed.is_empty() && content == previous {
                    return Vec::new();
                }

                let previous = previous.to_string();
                debug!("Removing {} exports from {}", removed.len(), path);
                self.observer.start(path, &previous);
                for export in &removed {
                    self.observer.remove_export(path, export);
                }
                self.store.set(path, &content);
                self.observer.end(path);

                self.summary.edited.insert(path.to_string());
                self.summary.removed_exports += removed.len();

                if removed.is_empty() {
                    return Vec::new();
                }
                let importees = self.graph.importees(path);
                self.cascade(importees)
            }
        }
    }

    /// Drop `export * from` statements whose target module was deleted
    fn clean_whole_reexports(&mut self) {
        let pending = std::mem::take(&mut self.reexport_cleanup);
        for (importer, specifier) in pending {
            let Some(text) = self.store.get(&importer) else {
                debug!("Skipping re-export cleanup in deleted module {}", importer);
                continue;
            };
            let Some(updated) = self.analyzer.remove_whole_reexport(text, &specifier) else {
                continue;
            };

            let previous = text.to_string();
            debug!("Removing `export * from '{}'` in {}", specifier, importer);
            self.observer.start(&importer, &previous);
            self.store.set(&importer, &updated);
            self.observer.end(&importer);
            self.summary.reexports_cleaned += 1;
            self.summary.edited.insert(importer);
        }
    }

    /// Run the analyzer's cleanup over edited modules. Returns tasks for the
    /// importees of every module it changed, whatever the cascade setting,
    /// since a pruned import can leave its target unused.
    fn secondary_cleanup(&mut self) -> Vec<Task> {
        let mut importees = BTreeSet::new();
        let targets: Vec<String> = self
            .summary
            .edited
            .iter()
            .filter(|path| self.store.exists(path))
            .cloned()
            .collect();

        for path in targets {
            let Some(text) = self.store.get(&path) else {
                continue;
            };
            let Some(updated) = self.analyzer.cleanup(&path, text) else {
                continue;
            };
            if updated == text {
                continue;
            }

            let previous = text.to_string();
            debug!("Pruned imports in {}", path);
            self.observer.start(&path, &previous);
            self.store.set(&path, &updated);
            self.observer.end(&path);
            importees.extend(self.graph.importees(&path));
            self.summary.cleaned_up.insert(path);
        }

        self.recheck(importees)
    }
}

impl<'a, 'o, A, O> TaskHandler<'a> for Session<'a, 'o, A, O>
where
    A: Analyzer,
    O: EditObserver + ?Sized,
{
    type Output = Result<AnalysisResult, AnalyzerError>;

    fn is_live(&self, task: &Task) -> bool {
        self.store.exists(&task.path)
    }

    fn prepare(&self, task: &Task) -> Job<'a, Self::Output> {
        let analyzer = self.analyzer;
        let graph = self.graph.snapshot();
        let store = self.store.snapshot();
        let path = task.path.clone();
        let allow_delete = self.options.delete_unused_modules && task.depth.is_some();

        Box::new(move || {
            analyzer.analyze(&AnalysisRequest {
                path: &path,
                graph: &graph,
                store: &store,
                allow_delete,
            })
        })
    }

    fn apply(&mut self, task: &Task, output: Self::Output) -> Result<Vec<Task>, EngineError> {
        let result = output.map_err(|source| EngineError::Analyzer {
            path: task.path.clone(),
            source,
        })?;
        Ok(self.apply_result(&task.path, result))
    }
}
