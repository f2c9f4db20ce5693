//! Analyzer boundary
//!
//! The engine never looks inside a module. It hands an [`Analyzer`] the module
//! path plus snapshots of the graph and store and gets back an
//! [`AnalysisResult`]. Implementations must be pure functions of their inputs
//! so they can run on worker threads.

mod export;
pub mod plan;
mod usage;

pub use export::{ExportItem, ExportSpecifier, Position, Span, DEFAULT_EXPORT};
pub use plan::{plan_removals, ModulePolicy, Plan, Removal};
pub use usage::{Usage, UsageFact};

use crate::graph::GraphSnapshot;
use crate::store::StoreSnapshot;
use serde::Serialize;
use thiserror::Error;

/// An export removed by an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedExport {
    pub symbol: String,
    /// Where the removed statement started in the pre-edit text
    pub position: Position,
}

impl RemovedExport {
    pub fn new(symbol: impl Into<String>, position: Position) -> Self {
        Self {
            symbol: symbol.into(),
            position,
        }
    }
}

/// Result of analyzing one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// The module is entirely unused
    Delete,
    /// Replace the module text. Unchanged text with nothing removed is a no-op
    Edit {
        content: String,
        removed: Vec<RemovedExport>,
    },
}

impl AnalysisResult {
    /// A result that leaves `text` as it is
    pub fn unchanged(text: &str) -> Self {
        AnalysisResult::Edit {
            content: text.to_string(),
            removed: Vec::new(),
        }
    }
}

/// Everything an analyzer gets for one module
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'r> {
    pub path: &'r str,
    pub graph: &'r GraphSnapshot,
    pub store: &'r StoreSnapshot,
    /// Whether [`AnalysisResult::Delete`] is permitted for this module
    pub allow_delete: bool,
}

/// Analyzer errors
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Module not found in snapshot: {0}")]
    MissingModule(String),
    #[error("Invalid edit in {path}: {reason}")]
    InvalidEdit { path: String, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Per-module analysis backend
pub trait Analyzer: Sync {
    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalyzerError>;

    /// Remove the bare `export * from '<specifier>'` statement from `text`.
    /// Returns `None` when no such statement exists.
    fn remove_whole_reexport(&self, text: &str, specifier: &str) -> Option<String>;

    /// Secondary cleanup run on edited modules after the fixpoint.
    /// Returns `None` when there is nothing to change.
    fn cleanup(&self, _path: &str, _text: &str) -> Option<String> {
        None
    }
}
