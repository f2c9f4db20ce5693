use super::{ChangeReport, ChangeStatus, ModuleChange};
use crate::engine::RunSummary;
use colored::Colorize;
use miette::Result;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// List each removed export under its module
    show_exports: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_exports: true }
    }

    pub fn with_exports(mut self, show: bool) -> Self {
        self.show_exports = show;
        self
    }

    pub fn report(&self, report: &ChangeReport, summary: &RunSummary) -> Result<()> {
        if report.is_empty() {
            println!("{}", "No unused exports found!".green().bold());
            return Ok(());
        }

        println!();
        println!(
            "{}",
            format!("Changed {} modules:", report.modules.len())
                .yellow()
                .bold()
        );
        println!();

        for module in &report.modules {
            self.print_module(module);
        }

        println!();
        self.print_summary(report, summary);

        Ok(())
    }

    fn print_module(&self, module: &ModuleChange) {
        let status = match module.status {
            ChangeStatus::Deleted => "deleted".red().bold(),
            ChangeStatus::Edited => "edited".yellow().bold(),
        };
        println!("  {} {}", status, module.path.cyan());

        if self.show_exports {
            for export in &module.removed_exports {
                println!(
                    "      {} {} '{}'",
                    export.position.to_string().dimmed(),
                    "removed export".dimmed(),
                    export.symbol
                );
            }
        }
    }

    fn print_summary(&self, report: &ChangeReport, summary: &RunSummary) {
        println!("{}", "Summary:".bold());
        println!("  {} modules deleted", report.deleted().count().to_string().red());
        println!("  {} modules edited", report.edited().count().to_string().yellow());
        println!(
            "  {} exports removed",
            report.removed_export_count().to_string().yellow()
        );
        if summary.reexports_cleaned > 0 {
            println!(
                "  {} dangling `export *` statements removed",
                summary.reexports_cleaned
            );
        }
        if !summary.cleaned_up.is_empty() {
            println!(
                "  {} modules had unused imports pruned",
                summary.cleaned_up.len()
            );
        }
        println!(
            "{}",
            format!(
                "  ({} analyses, {} skipped for removed modules)",
                summary.scheduler.executed, summary.scheduler.discarded
            )
            .dimmed()
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
