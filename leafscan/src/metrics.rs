use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters shared by every task of a scan
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Discovery
    folders_discovered: Arc<AtomicU64>,
    roots_rejected: Arc<AtomicU64>,

    // Search
    folders_searched: Arc<AtomicU64>,
    files_extracted: Arc<AtomicU64>,
    extraction_failures: Arc<AtomicU64>,
    task_panics: Arc<AtomicU64>,

    // Pattern cache
    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            folders_discovered: Arc::new(AtomicU64::new(0)),
            roots_rejected: Arc::new(AtomicU64::new(0)),
            folders_searched: Arc::new(AtomicU64::new(0)),
            files_extracted: Arc::new(AtomicU64::new(0)),
            extraction_failures: Arc::new(AtomicU64::new(0)),
            task_panics: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_folders_discovered(&self, count: u64) {
        self.folders_discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_root_rejected(&self) {
        self.roots_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_folder_searched(&self) {
        self.folders_searched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one extraction attempt and whether it failed
    pub fn record_extraction(&self, failed: bool) {
        self.files_extracted.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.extraction_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_task_panic(&self) {
        self.task_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a pattern cache lookup
    pub fn record_cache_operation(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Gets a point-in-time copy of every counter
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            folders_discovered: self.folders_discovered.load(Ordering::Relaxed),
            roots_rejected: self.roots_rejected.load(Ordering::Relaxed),
            folders_searched: self.folders_searched.load(Ordering::Relaxed),
            files_extracted: self.files_extracted.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            task_panics: self.task_panics.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Logs current scan statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Folders discovered/searched: {}/{}\n\
             Roots rejected: {}\n\
             Files extracted/failed: {}/{}\n\
             Task panics: {}\n\
             Pattern cache hits/misses: {}/{}",
            stats.folders_discovered,
            stats.folders_searched,
            stats.roots_rejected,
            stats.files_extracted,
            stats.extraction_failures,
            stats.task_panics,
            stats.cache_hits,
            stats.cache_misses
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the scan counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub folders_discovered: u64,
    pub roots_rejected: u64,
    pub folders_searched: u64,
    pub files_extracted: u64,
    pub extraction_failures: u64,
    pub task_panics: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}
