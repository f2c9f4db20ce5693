mod json;
mod recorder;
mod terminal;

pub use json::JsonReporter;
pub use recorder::{ChangeRecorder, ChangeReport, ChangeStatus, ModuleChange};
pub use terminal::TerminalReporter;

use crate::engine::RunSummary;
use miette::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for the changes of a run
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    pub fn report(&self, report: &ChangeReport, summary: &RunSummary) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(report, summary),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(report, summary),
        }
    }
}
