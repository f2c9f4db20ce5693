//! deadexport - remove unused exports from JavaScript and TypeScript projects
//!
//! Starting from a set of entrypoint modules, deadexport repeatedly removes
//! exports nobody imports and deletes modules nobody uses, until nothing
//! changes any more.
//!
//! # Architecture
//!
//! 1. **Discovery** - Find module files and load them into a [`ModuleStore`]
//! 2. **Graph Building** - Extract import edges and build the [`DependencyGraph`]
//! 3. **Fixpoint** - The [`Engine`] schedules per-module analyses on a bounded
//!    worker pool and applies their results until the queue drains
//! 4. **Cleanup** - Drop `export *` statements pointing at deleted modules
//! 5. **Reporting** - Render the recorded changes and write them to disk
//!
//! The engine knows nothing about module syntax; that lives behind the
//! [`Analyzer`] and [`EdgeExtractor`] traits, implemented for ES modules in
//! [`backend::es`].

pub mod analysis;
pub mod backend;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod graph;
pub mod refactor;
pub mod report;
pub mod store;

pub use analysis::{AnalysisRequest, AnalysisResult, Analyzer, AnalyzerError, RemovedExport};
pub use backend::{EsAnalyzer, EsEdgeExtractor};
pub use config::Config;
pub use discovery::FileFinder;
pub use engine::{EditObserver, Engine, EngineError, EngineOptions, RunOutcome, RunSummary};
pub use graph::{DependencyGraph, EdgeExtractor, ImportEdge};
pub use report::{ChangeRecorder, ReportFormat, Reporter};
pub use store::ModuleStore;
