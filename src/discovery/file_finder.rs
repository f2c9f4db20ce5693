use crate::config::Config;
use crate::store::ModuleStore;
use ignore::WalkBuilder;
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A discovered module file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,

    /// Path relative to the project root with `/` separators; the module key
    pub relative: String,
}

impl SourceFile {
    pub fn new(root: &Path, path: PathBuf) -> Option<Self> {
        let relative = relative_path(root, &path)?;
        Some(Self { path, relative })
    }

    pub fn read_contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))
    }
}

/// File finder for discovering modules in a project
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all module files under `root`, sorted by relative path
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        debug!("Scanning for files in: {}", root.display());

        let targets = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config
                .targets
                .iter()
                .map(|t| root.join(t))
                .collect()
        };

        let mut files: Vec<SourceFile> = targets
            .par_iter()
            .flat_map(|target| self.scan_directory(root, target))
            .collect();
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        files.dedup_by(|a, b| a.relative == b.relative);

        debug!("Found {} files", files.len());
        Ok(files)
    }

    fn scan_directory(&self, root: &Path, dir: &Path) -> Vec<SourceFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|entry| self.config.has_extension(entry.path()))
            .filter_map(|entry| SourceFile::new(root, entry.path().to_path_buf()))
            .filter(|file| {
                let excluded = self.config.should_exclude(&file.relative);
                if excluded {
                    trace!("Excluding: {}", file.relative);
                }
                !excluded
            })
            .collect()
    }
}

/// Read every file into a fresh [`ModuleStore`] keyed by relative path
pub fn load_store(files: &[SourceFile]) -> Result<ModuleStore> {
    let contents: Vec<(String, String)> = files
        .par_iter()
        .map(|file| Ok((file.relative.clone(), file.read_contents()?)))
        .collect::<Result<_>>()?;

    Ok(contents.into_iter().collect())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
