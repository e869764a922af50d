mod report;

use clap::Parser;
use leafscan::{
    paths::resolve_root, CliOverrides, ExtractorRegistry, ScanConfig, ScanError, Scanner,
};
use std::{num::NonZeroUsize, path::PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use report::TextReport;

type Result<T> = std::result::Result<T, ScanError>;

/// Finds final folders, searches the most recent document in each one for a
/// whole word, and lists the folders where it was found.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Word or phrase to search for (case-insensitive, whole word)
    #[arg(short = 't', long, required_unless_present = "print_config")]
    term: Option<String>,

    /// Root folders to scan
    #[arg(required_unless_present = "print_config")]
    roots: Vec<String>,

    /// Additional YAML config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Base folder for relative and network drive roots
    #[arg(short = 'b', long)]
    base_path: Option<PathBuf>,

    /// Folder name that ends descent (repeatable, replaces the defaults)
    #[arg(short = 's', long = "skip")]
    skip: Vec<String>,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Enabled extensions (e.g. xlsx,docx,csv)
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Also list folders without a match
    #[arg(long)]
    all: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            base_path: self.base_path.clone(),
            skip_folders: Some(self.skip.clone()),
            workers: self.workers,
            extensions: self.extensions.clone(),
            log_level: self.log_level.clone(),
            show_progress: self.no_progress.then_some(false),
        }
    }
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = ScanConfig::load_from(cli.config.as_deref())
        .map_err(|e| ScanError::config_error(e.to_string()))?
        .merge_with_cli(cli.overrides());
    init_logging(&config.log_level);

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let registry = build_registry(&config)?;
    debug!("Enabled formats: {:?}", registry);

    let roots: Vec<PathBuf> = cli
        .roots
        .iter()
        .filter_map(|input| {
            let root = resolve_root(
                input,
                config.base_path.as_deref(),
                config.network_drive_prefix.as_deref(),
            );
            if root.is_none() {
                warn!("Ignoring blank root");
            }
            root
        })
        .collect();
    if roots.is_empty() {
        return Err(ScanError::config_error("no root folders given"));
    }

    let term = cli.term.unwrap_or_default();
    let scanner = Scanner::new(&config, registry)?;
    let report = scanner.run(&roots, &term)?;

    if cli.json {
        println!("{}", report::to_json(&report)?);
    } else {
        print!("{}", TextReport::new(&report, cli.all));
    }
    Ok(())
}

fn build_registry(config: &ScanConfig) -> Result<ExtractorRegistry> {
    let registry = ExtractorRegistry::with_defaults();
    match config.normalized_extensions() {
        Some(extensions) => registry.restrict_to(&extensions),
        None => Ok(registry),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
