use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::paths::sort_key;

/// Maximum number of match locations kept for display
pub const MATCH_DISPLAY_CAP: usize = 5;

/// Where the term was found in the searched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Up to `MATCH_DISPLAY_CAP` location labels, in file order
    pub locations: Vec<String>,
    /// Matches found beyond the displayed ones
    pub overflow: usize,
}

impl MatchSummary {
    /// Caps `labels` for display. Returns `None` when there are no labels.
    pub fn from_labels(labels: Vec<String>) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }
        let overflow = labels.len().saturating_sub(MATCH_DISPLAY_CAP);
        let mut locations = labels;
        locations.truncate(MATCH_DISPLAY_CAP);
        Some(Self {
            locations,
            overflow,
        })
    }

    /// Total number of matches, displayed or not
    pub fn total(&self) -> usize {
        self.locations.len() + self.overflow
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locations.join("; "))?;
        if self.overflow > 0 {
            write!(f, " (+{} more)", self.overflow)?;
        }
        Ok(())
    }
}

/// What happened when a folder's file was searched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// No file was selected, so nothing was searched
    NotSearched,
    NoMatch,
    Matched,
    /// The selected file could not be read; reported as no match
    Failed(String),
}

/// Result for one final folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderOutcome {
    pub name: String,
    pub path: PathBuf,
    pub candidate_files: Vec<String>,
    pub selected_file: Option<String>,
    #[serde(serialize_with = "serialize_time")]
    pub selected_file_modified_at: Option<SystemTime>,
    pub match_found: bool,
    pub match_details: Option<MatchSummary>,
    pub search_status: SearchStatus,
}

impl FolderOutcome {
    /// Outcome for a folder where no file was searched
    pub fn not_searched(path: PathBuf, candidate_files: Vec<String>) -> Self {
        Self {
            name: folder_name(&path),
            path,
            candidate_files,
            selected_file: None,
            selected_file_modified_at: None,
            match_found: false,
            match_details: None,
            search_status: SearchStatus::NotSearched,
        }
    }

    /// Outcome for a folder whose selected file was searched.
    ///
    /// `match_found` is derived from `labels`, so it can never disagree with
    /// `match_details`. A failed search carries no details.
    pub fn searched(
        path: PathBuf,
        candidate_files: Vec<String>,
        selected_file: String,
        modified_at: Option<SystemTime>,
        result: Result<Vec<String>, String>,
    ) -> Self {
        let (match_details, search_status) = match result {
            Ok(labels) => match MatchSummary::from_labels(labels) {
                Some(summary) => (Some(summary), SearchStatus::Matched),
                None => (None, SearchStatus::NoMatch),
            },
            Err(reason) => (None, SearchStatus::Failed(reason)),
        };
        Self {
            name: folder_name(&path),
            path,
            candidate_files,
            selected_file: Some(selected_file),
            selected_file_modified_at: modified_at,
            match_found: match_details.is_some(),
            match_details,
            search_status,
        }
    }

    /// Outcome for a folder whose search task died before finishing
    pub fn task_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            search_status: SearchStatus::Failed(reason.into()),
            ..Self::not_searched(path, Vec::new())
        }
    }

    /// Whether the selected file could not be read
    pub fn is_failed(&self) -> bool {
        matches!(self.search_status, SearchStatus::Failed(_))
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn serialize_time<S: Serializer>(time: &Option<SystemTime>, s: S) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => s.serialize_some(&humantime::format_rfc3339_seconds(*t).to_string()),
        None => s.serialize_none(),
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub term: String,
    /// Sorted by case-insensitive path
    pub outcomes: Vec<FolderOutcome>,
    pub folders_processed: usize,
    pub folders_with_matches: usize,
    /// Roots that could not be scanned
    pub warnings: Vec<String>,
}

impl ScanReport {
    /// Builds a report, sorting outcomes and computing the tallies
    pub fn new(
        term: impl Into<String>,
        mut outcomes: Vec<FolderOutcome>,
        warnings: Vec<String>,
    ) -> Self {
        outcomes.sort_by_cached_key(|o| sort_key(&o.path));
        let folders_with_matches = outcomes.iter().filter(|o| o.match_found).count();
        Self {
            term: term.into(),
            folders_processed: outcomes.len(),
            folders_with_matches,
            outcomes,
            warnings,
        }
    }

    /// Outcomes with a match, in report order
    pub fn matches(&self) -> impl Iterator<Item = &FolderOutcome> {
        self.outcomes.iter().filter(|o| o.match_found)
    }

    /// Folders whose selected file failed to extract
    pub fn failures(&self) -> impl Iterator<Item = &FolderOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}
