use super::{ChangeReport, ModuleChange};
use crate::engine::RunSummary;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn render(&self, report: &ChangeReport, summary: &RunSummary) -> Result<String> {
        let json = JsonReport::new(report, summary);
        serde_json::to_string_pretty(&json).into_diagnostic()
    }

    pub fn report(&self, report: &ChangeReport, summary: &RunSummary) -> Result<()> {
        let json = self.render(report, summary)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'r> {
    version: &'static str,
    modules: &'r [ModuleChange],
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    deleted: usize,
    edited: usize,
    removed_exports: usize,
    reexports_cleaned: usize,
    imports_pruned: usize,
    analyses: usize,
    discarded: usize,
    coalesced: usize,
}

impl<'r> JsonReport<'r> {
    fn new(report: &'r ChangeReport, summary: &RunSummary) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            modules: &report.modules,
            summary: JsonSummary {
                deleted: report.deleted().count(),
                edited: report.edited().count(),
                removed_exports: report.removed_export_count(),
                reexports_cleaned: summary.reexports_cleaned,
                imports_pruned: summary.cleaned_up.len(),
                analyses: summary.scheduler.executed,
                discarded: summary.scheduler.discarded,
                coalesced: summary.scheduler.coalesced,
            },
        }
    }
}
