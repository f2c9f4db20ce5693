use crate::analysis::AnalyzerError;
use miette::Diagnostic;
use thiserror::Error;

/// Engine errors. All of them abort the run
#[derive(Error, Diagnostic, Debug)]
pub enum EngineError {
    #[error("No entrypoints given")]
    #[diagnostic(
        code(deadexport::engine::no_entrypoints),
        help("pass at least one --entry or set `entrypoints` in the config file")
    )]
    NoEntrypoints,

    #[error("Entrypoint not found among discovered modules: {0}")]
    #[diagnostic(code(deadexport::engine::missing_entrypoint))]
    MissingEntrypoint(String),

    #[error("Analysis failed for {path}")]
    #[diagnostic(code(deadexport::engine::analyzer))]
    Analyzer {
        path: String,
        #[source]
        source: AnalyzerError,
    },

    #[error("Failed to start worker pool: {0}")]
    #[diagnostic(code(deadexport::engine::thread_pool))]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Worker panicked while analyzing {0}")]
    #[diagnostic(code(deadexport::engine::worker_panicked))]
    WorkerPanicked(String),

    #[error("A worker exited without reporting its result")]
    #[diagnostic(code(deadexport::engine::worker_lost))]
    WorkerLost,
}
