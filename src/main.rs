use clap::Parser;
use colored::Colorize;
use deadexport::config::Config;
use deadexport::discovery::{load_store, FileFinder};
use deadexport::refactor::{ChangeSet, ChangeWriter};
use deadexport::report::{ChangeRecorder, ReportFormat, Reporter};
use deadexport::{EsAnalyzer, EsEdgeExtractor, Engine};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// deadexport - Remove unused exports from JavaScript and TypeScript projects
#[derive(Parser, Debug)]
#[command(name = "deadexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project root
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Entrypoint module relative to the project root (can be specified multiple times)
    #[arg(short, long = "entry", value_name = "MODULE")]
    entry: Vec<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target directories to scan (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(long)]
    exclude: Vec<String>,

    /// Keep modules that become unused; only remove exports
    #[arg(long)]
    no_delete_files: bool,

    /// Do not re-analyze imported modules after a change
    #[arg(long)]
    no_recursive: bool,

    /// Prune unused imports in edited modules after the run
    #[arg(long)]
    cleanup_imports: bool,

    /// Number of worker threads (default: one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the json format
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Confirm each file change
    #[arg(long)]
    interactive: bool,

    /// Generate undo script
    #[arg(long)]
    undo_script: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("deadexport v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&cli.path)?
    };

    // CLI arguments override the file
    if !cli.entry.is_empty() {
        config.entrypoints = cli.entry.clone();
    }
    config.entrypoints = config
        .entrypoints
        .iter()
        .map(|e| normalize_module_path(e))
        .collect();
    if !cli.target.is_empty() {
        config.targets = cli.target.clone();
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if cli.no_delete_files {
        config.delete_unused_files = false;
    }
    if cli.no_recursive {
        config.recursive = false;
    }
    if cli.cleanup_imports {
        config.cleanup_imports = true;
    }
    if let Some(jobs) = cli.jobs {
        config.concurrency = jobs;
    }
    if config.concurrency == 0 {
        config.concurrency = rayon::current_num_threads();
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }

    Ok(config)
}

fn normalize_module_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    info!("Discovering files...");
    let files = FileFinder::new(config).find_files(&cli.path)?;
    info!("Found {} modules", files.len());

    if files.is_empty() {
        println!("{}", "No JavaScript or TypeScript modules found.".yellow());
        return Ok(());
    }

    let store = load_store(&files)?;

    let spinner = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .into_diagnostic()?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    spinner.set_message(format!("Removing unused exports from {} modules...", store.len()));

    let analyzer = EsAnalyzer::new(config.skip_marker.clone());
    let extractor = EsEdgeExtractor;
    let engine = Engine::new(&analyzer, &extractor, config.engine_options());
    let mut recorder = ChangeRecorder::new();
    let result = engine.run(store.clone(), &mut recorder);
    spinner.finish_and_clear();
    let outcome = result?;

    info!(
        "Fixpoint reached in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    let report = recorder.into_report(&outcome.store);
    let reporter = Reporter::new(config.report.format, cli.output.clone());
    reporter.report(&report, &outcome.summary)?;

    let changes = ChangeSet::between(&store, &outcome.store);
    let writer = ChangeWriter::new(
        &cli.path,
        cli.interactive,
        cli.dry_run,
        cli.undo_script.clone(),
    );
    let stats = writer.write(&store, &changes)?;
    info!(
        "{} files rewritten, {} deleted, {} failed",
        stats.rewritten, stats.deleted, stats.failed
    );

    if stats.failed > 0 {
        return Err(miette::miette!("{} file changes failed", stats.failed));
    }

    Ok(())
}
