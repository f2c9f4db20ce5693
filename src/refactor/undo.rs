use miette::{IntoDiagnostic, Result, WrapErr};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const EOF_MARKER: &str = "DEADEXPORT_EOF";

/// Generates a shell script that restores touched files to their original text
pub struct UndoScript {
    /// Contents before the first modification, by file
    file_states: BTreeMap<PathBuf, String>,
}

impl UndoScript {
    pub fn new() -> Self {
        Self {
            file_states: BTreeMap::new(),
        }
    }

    /// Record the state of a file before it is rewritten or removed.
    /// Later calls for the same file are ignored.
    pub fn record_file_state(&mut self, path: &Path, contents: &str) {
        self.file_states
            .entry(path.to_path_buf())
            .or_insert_with(|| contents.to_string());
    }

    pub fn render(&self) -> String {
        let mut script = String::new();

        script.push_str("#!/bin/bash\n");
        script.push_str("# deadexport undo script\n");
        script.push_str("# Restores every file changed or removed by the last run\n\n");
        script.push_str("set -e\n\n");

        for (file_path, contents) in &self.file_states {
            let quoted = shell_quote(&file_path.display().to_string());

            script.push_str(&format!("# {}\n", file_path.display()));
            if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                script.push_str(&format!(
                    "mkdir -p {}\n",
                    shell_quote(&parent.display().to_string())
                ));
            }
            script.push_str(&format!("cat > {} << '{}'\n", quoted, EOF_MARKER));
            script.push_str(contents);
            if !contents.ends_with('\n') {
                script.push('\n');
            }
            script.push_str(EOF_MARKER);
            script.push('\n');
            script.push_str(&format!("echo \"  restored {}\"\n\n", file_path.display()));
        }

        script.push_str(&format!("echo \"{} files restored\"\n", self.file_states.len()));
        script
    }

    /// Write the undo script to a file
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write undo script {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path).into_diagnostic()?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(path, perms).into_diagnostic()?;
        }

        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.file_states.len()
    }
}

impl Default for UndoScript {
    fn default() -> Self {
        Self::new()
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
