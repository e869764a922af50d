use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::debug;

use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;

/// Whole-word, case-insensitive term matching.
///
/// A term matches when no word character (Unicode letter, digit or
/// underscore) sits immediately before or after it. The term is always
/// escaped, so `a.b` only ever matches the literal text `a.b`.
///
/// Compiled patterns live in a per-engine cache. Share one engine (it is
/// cheap to clone) across every task of a scan.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    cache: Arc<DashMap<String, Arc<Regex>>>,
    metrics: ScanMetrics,
}

impl MatchEngine {
    /// Creates an engine with its own empty cache
    pub fn new() -> Self {
        Self::with_metrics(ScanMetrics::new())
    }

    /// Creates an engine that records cache hits and misses in `metrics`
    pub fn with_metrics(metrics: ScanMetrics) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            metrics,
        }
    }

    /// Gets the metrics this engine reports into
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Returns the compiled pattern for `term`, compiling it on first use.
    ///
    /// Two threads asking for a new term at once may both compile it; the
    /// later insert wins and both patterns are identical.
    pub fn compile(&self, term: &str) -> ScanResult<Arc<Regex>> {
        if let Some(entry) = self.cache.get(term) {
            self.metrics.record_cache_operation(true);
            return Ok(Arc::clone(entry.value()));
        }

        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(ScanError::invalid_pattern("search term is empty"));
        }

        let source = format!(r"(?:^|[^\w]){}(?:[^\w]|$)", regex::escape(trimmed));
        debug!("Compiling whole-word pattern for '{}': {}", trimmed, source);
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| ScanError::invalid_pattern(e.to_string()))?;
        let regex = Arc::new(regex);

        self.metrics.record_cache_operation(false);
        self.cache.insert(term.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    /// Whether `term` occurs in `text` as a whole word, ignoring case.
    /// An invalid term never matches.
    pub fn is_exact_match(&self, text: &str, term: &str) -> bool {
        match self.compile(term) {
            Ok(regex) => regex.is_match(text),
            Err(_) => false,
        }
    }

    /// Number of distinct terms compiled so far
    pub fn cached_terms(&self) -> usize {
        self.cache.len()
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}
