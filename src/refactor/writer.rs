use crate::refactor::undo::UndoScript;
use crate::store::Modules;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single file-level change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Rewrite { path: String, contents: String },
    Delete { path: String },
}

impl FileChange {
    pub fn path(&self) -> &str {
        match self {
            FileChange::Rewrite { path, .. } | FileChange::Delete { path } => path,
        }
    }
}

/// Difference between the store a run started from and the one it ended with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: Vec<FileChange>,
}

impl ChangeSet {
    pub fn between(original: &Modules, result: &Modules) -> Self {
        let changes = original
            .iter()
            .filter_map(|(path, text)| match result.get(path) {
                None => Some(FileChange::Delete {
                    path: path.to_string(),
                }),
                Some(updated) if updated != text => Some(FileChange::Rewrite {
                    path: path.to_string(),
                    contents: updated.to_string(),
                }),
                Some(_) => None,
            })
            .collect();
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub rewritten: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Applies a [`ChangeSet`] to the files under `root`
pub struct ChangeWriter {
    root: PathBuf,
    interactive: bool,
    dry_run: bool,
    undo_script_path: Option<PathBuf>,
}

impl ChangeWriter {
    pub fn new(
        root: impl Into<PathBuf>,
        interactive: bool,
        dry_run: bool,
        undo_script_path: Option<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            interactive,
            dry_run,
            undo_script_path,
        }
    }

    pub fn write(&self, original: &Modules, changes: &ChangeSet) -> Result<WriteStats> {
        let mut stats = WriteStats::default();

        if changes.is_empty() {
            println!("{}", "No changes to write.".green());
            return Ok(stats);
        }

        if self.dry_run {
            println!();
            println!("{}", "Dry run - would change:".yellow().bold());
            for change in &changes.changes {
                match change {
                    FileChange::Rewrite { path, .. } => println!("  {} {}", "edit".cyan(), path),
                    FileChange::Delete { path } => println!("  {} {}", "delete".red(), path),
                }
            }
            println!();
            println!(
                "{}",
                format!("Total: {} files would change", changes.len()).dimmed()
            );
            stats.skipped = changes.len();
            return Ok(stats);
        }

        let mut undo_script = self.undo_script_path.as_ref().map(|_| UndoScript::new());

        println!();
        println!("{}", "Writing changes...".cyan().bold());

        for change in &changes.changes {
            if self.interactive && !self.confirm(change)? {
                stats.skipped += 1;
                continue;
            }

            let file = self.root.join(change.path());
            if let (Some(script), Some(previous)) = (undo_script.as_mut(), original.get(change.path())) {
                script.record_file_state(&file, previous);
            }

            match apply_change(&file, change) {
                Ok(()) => {
                    match change {
                        FileChange::Rewrite { .. } => stats.rewritten += 1,
                        FileChange::Delete { .. } => stats.deleted += 1,
                    }
                    println!("  {} {}", "✓".green(), change.path());
                }
                Err(e) => {
                    stats.failed += 1;
                    println!("  {} {}: {}", "✗".red(), change.path(), e);
                }
            }
        }

        if let (Some(script), Some(path)) = (undo_script, &self.undo_script_path) {
            script.write(path)?;
            println!();
            println!("{} Undo script saved to: {}", "→".dimmed(), path.display());
        }

        Ok(stats)
    }

    fn confirm(&self, change: &FileChange) -> Result<bool> {
        let prompt = match change {
            FileChange::Rewrite { path, .. } => format!("Rewrite {}?", path),
            FileChange::Delete { path } => format!("Delete {}?", path),
        };
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(true)
            .interact()
            .into_diagnostic()
    }
}

fn apply_change(file: &Path, change: &FileChange) -> Result<()> {
    match change {
        FileChange::Rewrite { contents, .. } => {
            debug!("Rewriting {}", file.display());
            std::fs::write(file, contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", file.display()))
        }
        FileChange::Delete { .. } => {
            debug!("Removing {}", file.display());
            std::fs::remove_file(file)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to remove {}", file.display()))
        }
    }
}
