// Language backends implementing the analyzer and edge extraction seams

pub mod es;

pub use es::{EsAnalyzer, EsEdgeExtractor};
