use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use std::any::Any;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

use super::matcher::MatchEngine;
use crate::config::ScanConfig;
use crate::discovery::{classify, immediate_subdirectories, validate_root, SkipSet};
use crate::errors::{ScanError, ScanResult};
use crate::extract::{ContentExtractor, ExtractorRegistry};
use crate::metrics::ScanMetrics;
use crate::paths::unify_path;
use crate::recency::{list_candidates, select_most_recent};
use crate::results::{FolderOutcome, ScanReport};

/// Final folders found under a set of roots, plus the roots that were rejected
#[derive(Debug, Default)]
pub struct Discovery {
    pub folders: BTreeSet<PathBuf>,
    pub warnings: Vec<String>,
}

/// Runs a scan: discovers final folders under each root, then searches the
/// most recent supported file in each of them for a whole-word term.
///
/// Both phases run on a dedicated pool of `workers` threads and are joined
/// before the next phase starts. A panic inside one task is contained to that
/// task: a discovery task contributes no folders, a search task reports its
/// folder as not matching.
#[derive(Debug, Clone)]
pub struct Scanner {
    skip: SkipSet,
    registry: ExtractorRegistry,
    engine: MatchEngine,
    metrics: ScanMetrics,
    workers: NonZeroUsize,
    show_progress: bool,
}

impl Scanner {
    /// Creates a scanner searching the formats in `registry`.
    /// Fails when `registry` has no formats.
    pub fn new(config: &ScanConfig, registry: ExtractorRegistry) -> ScanResult<Self> {
        registry.ensure_usable()?;
        let metrics = ScanMetrics::new();
        Ok(Self {
            skip: SkipSet::new(&config.skip_folders),
            registry,
            engine: MatchEngine::with_metrics(metrics.clone()),
            metrics,
            workers: config.workers,
            show_progress: config.show_progress,
        })
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Scans `roots` for `term`.
    ///
    /// Only an unusable term or a pool that cannot start are errors. Bad
    /// roots end up in `ScanReport::warnings`, unreadable files in the
    /// outcome's search status.
    pub fn run(&self, roots: &[PathBuf], term: &str) -> ScanResult<ScanReport> {
        let pattern = self.engine.compile(term)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.get())
            .thread_name(|i| format!("leafscan-{}", i))
            .build()
            .map_err(|e| ScanError::config_error(format!("cannot start worker pool: {}", e)))?;

        info!(
            "Scanning {} root(s) for '{}' with {} workers",
            roots.len(),
            term.trim(),
            self.workers
        );

        let discovery = pool.install(|| self.discover(roots));
        info!(
            "Discovery complete: {} final folder(s)",
            discovery.folders.len()
        );

        let outcomes = pool.install(|| self.search_all(&discovery.folders, &pattern));
        let report = ScanReport::new(term.trim(), outcomes, discovery.warnings);

        self.metrics.log_stats();
        info!(
            "Scan complete. {} of {} folder(s) matched",
            report.folders_with_matches, report.folders_processed
        );
        Ok(report)
    }

    /// Finds every final folder under `roots`, in parallel on the current pool.
    ///
    /// Each non-skip subdirectory of a root is its own task. A root without
    /// such subdirectories is itself final, even when its own name is a skip
    /// name, because it was asked for explicitly. Nothing below a skip-named
    /// root is ever classified. Paths are unified so overlapping roots do not
    /// produce duplicates.
    pub fn discover(&self, roots: &[PathBuf]) -> Discovery {
        let mut discovery = Discovery::default();
        let mut tasks = Vec::new();

        for root in roots {
            if let Err(e) = validate_root(root) {
                warn!("Skipping root {}: {}", root.display(), e);
                self.metrics.record_root_rejected();
                discovery.warnings.push(e.to_string());
                continue;
            }
            let subdirs = immediate_subdirectories(root, &self.skip);
            if subdirs.is_empty() {
                debug!("Root {} is itself a final folder", root.display());
                discovery.folders.insert(unify_path(root));
            } else if self.skip.is_skip_folder(root) {
                debug!(
                    "Root {} is a skip folder, not descending into it",
                    root.display()
                );
            } else {
                tasks.extend(subdirs);
            }
        }

        debug!("Classifying {} subtree(s)", tasks.len());
        let found: Vec<BTreeSet<PathBuf>> = tasks
            .par_iter()
            .map(|dir| match catch_unwind(AssertUnwindSafe(|| classify(dir, &self.skip))) {
                Ok(Ok(folders)) => folders,
                Ok(Err(e)) => {
                    warn!("Could not classify {}: {}", dir.display(), e);
                    BTreeSet::new()
                }
                Err(payload) => {
                    self.metrics.record_task_panic();
                    let e = ScanError::task(panic_message(payload.as_ref()));
                    warn!("Discovery of {} aborted: {}", dir.display(), e);
                    BTreeSet::new()
                }
            })
            .collect();

        for folder in found.into_iter().flatten() {
            discovery.folders.insert(unify_path(&folder));
        }
        self.metrics
            .record_folders_discovered(discovery.folders.len() as u64);
        discovery
    }

    fn search_all(&self, folders: &BTreeSet<PathBuf>, pattern: &Regex) -> Vec<FolderOutcome> {
        let progress = self.progress_bar(folders.len() as u64);
        let folders: Vec<&PathBuf> = folders.iter().collect();

        let outcomes = folders
            .par_iter()
            .map(|folder| {
                let outcome =
                    match catch_unwind(AssertUnwindSafe(|| self.search_with(folder, pattern))) {
                        Ok(outcome) => outcome,
                        Err(payload) => {
                            self.metrics.record_task_panic();
                            let e = ScanError::task(panic_message(payload.as_ref()));
                            warn!("Search of {} aborted: {}", folder.display(), e);
                            FolderOutcome::task_failed(folder.to_path_buf(), e.to_string())
                        }
                    };
                progress.inc(1);
                outcome
            })
            .collect();

        progress.finish_and_clear();
        outcomes
    }

    /// Searches one final folder for `term`
    pub fn search_folder(&self, folder: &Path, term: &str) -> ScanResult<FolderOutcome> {
        let pattern = self.engine.compile(term)?;
        Ok(self.search_with(folder, &pattern))
    }

    fn search_with(&self, folder: &Path, pattern: &Regex) -> FolderOutcome {
        self.metrics.record_folder_searched();
        let candidates = list_candidates(folder, &self.registry);
        let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();

        let Some(selected) = select_most_recent(&candidates) else {
            debug!("Nothing to search in {}", folder.display());
            return FolderOutcome::not_searched(folder.to_path_buf(), names);
        };
        let Some(extractor) = self.registry.for_path(&selected.path) else {
            return FolderOutcome::not_searched(folder.to_path_buf(), names);
        };

        debug!(
            "Searching {} with {} extractor",
            selected.path.display(),
            extractor.name()
        );
        let result = find_locations(extractor.as_ref(), &selected.path, pattern);
        self.metrics.record_extraction(result.is_err());
        let result = result.map_err(|e| {
            warn!("{}", e);
            e.to_string()
        });

        FolderOutcome::searched(
            folder.to_path_buf(),
            names,
            selected.name.clone(),
            selected.modified,
            result,
        )
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} folders")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style);
        progress
    }
}

/// Labels of every fragment of `path` containing the pattern, in file order.
///
/// A fragment with parts is matched as a whole first. The parts that match on
/// their own are reported; if none does, the fragment's own label is. Any
/// error, from opening the file or from one fragment, fails the whole file.
fn find_locations(
    extractor: &dyn ContentExtractor,
    path: &Path,
    pattern: &Regex,
) -> ScanResult<Vec<String>> {
    let mut labels = Vec::new();
    for fragment in extractor.extract(path)? {
        let fragment = fragment?;
        if !pattern.is_match(&fragment.text) {
            continue;
        }
        let before = labels.len();
        labels.extend(
            fragment
                .parts
                .iter()
                .filter(|part| pattern.is_match(&part.text))
                .map(|part| part.label.clone()),
        );
        if labels.len() == before {
            labels.push(fragment.label);
        }
    }
    trace!("{} match(es) in {}", labels.len(), path.display());
    Ok(labels)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}
