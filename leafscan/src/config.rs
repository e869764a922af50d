use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::ScanResult;

/// Folder names that end descent unless configured otherwise
pub const DEFAULT_SKIP_FOLDERS: [&str; 4] = ["old", "test", "bug", "feasibility"];

/// Worker pool size when nothing else is configured. Sized for network
/// backed drives where each stat is slow rather than for CPU count.
pub const DEFAULT_WORKERS: usize = 16;

/// Prefix under which Windows paths are mapped onto the base path
pub const DEFAULT_NETWORK_DRIVE_PREFIX: &str = r"G:\My Drive";

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.leafscan.yaml` in the current directory
/// 3. Global `$HOME/.config/leafscan/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Relative roots are resolved against this folder
/// base_path: "/content/drive/MyDrive"
///
/// # Windows paths starting with this prefix are mapped onto base_path
/// network_drive_prefix: 'G:\My Drive'
///
/// # Folder names (case-insensitive) that are never descended into
/// skip_folders: ["old", "test", "bug", "feasibility"]
///
/// # Parallel tasks per phase
/// workers: 16
///
/// # Restrict the searched formats
/// extensions: [".xlsx", ".docx"]
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
///
/// show_progress: true
/// ```
///
/// Command-line arguments take precedence over file values, see `merge_with_cli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Base folder for relative root inputs
    #[serde(default)]
    pub base_path: Option<PathBuf>,

    /// Windows drive prefix rewritten relative to `base_path`
    #[serde(default = "default_network_drive_prefix")]
    pub network_drive_prefix: Option<String>,

    /// Folder names that terminate descent
    #[serde(default = "default_skip_folders")]
    pub skip_folders: Vec<String>,

    /// Number of parallel tasks per phase
    #[serde(default = "default_workers")]
    pub workers: NonZeroUsize,

    /// Enabled extensions (e.g. [".xlsx", "csv"]). None enables every
    /// extension the registry knows about.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to draw a progress bar while searching folders
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_network_drive_prefix() -> Option<String> {
    Some(DEFAULT_NETWORK_DRIVE_PREFIX.to_string())
}

fn default_skip_folders() -> Vec<String> {
    DEFAULT_SKIP_FOLDERS.iter().map(|s| s.to_string()).collect()
}

fn default_workers() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_show_progress() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            network_drive_prefix: default_network_drive_prefix(),
            skip_folders: default_skip_folders(),
            workers: default_workers(),
            extensions: None,
            log_level: default_log_level(),
            show_progress: default_show_progress(),
        }
    }
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_path: Option<PathBuf>,
    pub skip_folders: Option<Vec<String>>,
    pub workers: Option<NonZeroUsize>,
    pub extensions: Option<Vec<String>>,
    pub log_level: Option<String>,
    pub show_progress: Option<bool>,
}

impl ScanConfig {
    /// Loads configuration from the default locations plus an explicit file,
    /// which must exist
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("leafscan/config.yaml")),
            // Local config
            Some(PathBuf::from(".leafscan.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if cli.base_path.is_some() {
            self.base_path = cli.base_path;
        }
        if let Some(skip) = cli.skip_folders.filter(|s| !s.is_empty()) {
            self.skip_folders = skip;
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if cli.extensions.is_some() {
            self.extensions = cli.extensions;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        if let Some(show) = cli.show_progress {
            self.show_progress = show;
        }
        self
    }

    /// Renders the effective configuration as YAML, in the same shape the
    /// config files use
    pub fn to_yaml(&self) -> ScanResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Enabled extensions in registry form (lowercase, leading dot)
    pub fn normalized_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|exts| {
            exts.iter()
                .map(|e| normalize_extension(e))
                .filter(|e| e.len() > 1)
                .collect()
        })
    }
}

/// Lowercases an extension and gives it a leading dot
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    format!(".{}", ext)
}
