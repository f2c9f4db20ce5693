use crate::backend::es::EXTENSIONS;
use crate::engine::{EngineOptions, DEFAULT_SKIP_MARKER};
use crate::report::ReportFormat;
use miette::{IntoDiagnostic, Result, WrapErr};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for a deadexport run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entrypoint modules, relative to the project root
    pub entrypoints: Vec<String>,

    /// Directories to scan, relative to the project root
    pub targets: Vec<PathBuf>,

    /// Glob patterns to exclude, matched against root-relative paths
    pub exclude: Vec<String>,

    /// File extensions treated as modules
    pub extensions: Vec<String>,

    /// Delete modules that end up unreachable or entirely unused
    pub delete_unused_files: bool,

    /// Prune unused import bindings in edited modules
    pub cleanup_imports: bool,

    /// Re-analyze importees after a module changes
    pub recursive: bool,

    /// Worker threads; 0 picks one per CPU
    pub concurrency: usize,

    /// Comment marker protecting an export from removal
    pub skip_marker: String,

    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entrypoints: vec![],
            targets: vec![],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/*.d.ts".to_string(),
            ],
            extensions: EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            delete_unused_files: true,
            cleanup_imports: false,
            recursive: true,
            concurrency: 0,
            skip_marker: DEFAULT_SKIP_MARKER.to_string(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Load the first config file found in `project_root`, or the defaults
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".deadexport.yml",
            ".deadexport.yaml",
            ".deadexport.toml",
            "deadexport.yml",
            "deadexport.yaml",
            "deadexport.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Check a root-relative, `/`-separated path against the exclude patterns
    pub fn should_exclude(&self, relative: &str) -> bool {
        self.exclude.iter().any(|pattern| glob_match(pattern, relative))
    }

    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            entrypoints: self.entrypoints.clone(),
            delete_unused_modules: self.delete_unused_files,
            secondary_cleanup: self.cleanup_imports,
            cascade: self.recursive,
            concurrency: self.concurrency,
            skip_marker: self.skip_marker.clone(),
        }
    }
}

/// Glob matching: `**` spans directories, `*` and `?` stay within one
/// segment. A pattern without `/` is matched against the file name alone.
fn glob_match(pattern: &str, path: &str) -> bool {
    let text = if pattern.contains('/') {
        path
    } else {
        path.rsplit('/').next().unwrap_or(path)
    };

    let mut re = String::from("^");
    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("**/") {
            re.push_str("(?:.*/)?");
            rest = tail;
            continue;
        }
        if let Some(tail) = rest.strip_prefix("**") {
            re.push_str(".*");
            rest = tail;
            continue;
        }
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            _ => re.push_str(&regex::escape(&c.to_string())),
        }
        rest = &rest[c.len_utf8()..];
    }
    re.push('$');

    Regex::new(&re).map(|re| re.is_match(text)).unwrap_or(false)
}
