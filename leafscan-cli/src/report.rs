use colored::Colorize;
use leafscan::{FolderOutcome, ScanError, ScanReport, SearchStatus};
use std::fmt;

/// Marker printed next to the file that was searched
pub const SEARCHED_MARKER: &str = "--> SEARCHED (most recent)";

/// Human readable report. Folders without a match are only listed when
/// `show_all` is set.
pub struct TextReport<'a> {
    report: &'a ScanReport,
    show_all: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a ScanReport, show_all: bool) -> Self {
        Self { report, show_all }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        for warning in &report.warnings {
            writeln!(f, "{} {}", "warning:".yellow().bold(), warning)?;
        }
        if !report.warnings.is_empty() {
            writeln!(f)?;
        }

        writeln!(f, "Search results for '{}'", report.term.bold())?;
        writeln!(f, "Folders processed: {}", report.folders_processed)?;
        writeln!(
            f,
            "Folders with matches: {}",
            report.folders_with_matches.to_string().green()
        )?;

        for (index, outcome) in report.matches().enumerate() {
            writeln!(f)?;
            write_match(f, index + 1, outcome)?;
        }

        if self.show_all {
            let misses: Vec<&FolderOutcome> =
                report.outcomes.iter().filter(|o| !o.match_found).collect();
            if !misses.is_empty() {
                writeln!(f, "\nFolders without matches:")?;
                for outcome in misses {
                    writeln!(
                        f,
                        "  {} ({})",
                        outcome.path.display().to_string().blue(),
                        status_text(outcome)
                    )?;
                }
            }
        }
        Ok(())
    }
}

fn write_match(f: &mut fmt::Formatter<'_>, index: usize, outcome: &FolderOutcome) -> fmt::Result {
    writeln!(f, "{}. {}", index, outcome.name.bold())?;
    writeln!(f, "   Path: {}", outcome.path.display().to_string().blue())?;
    writeln!(f, "   Files:")?;
    for name in &outcome.candidate_files {
        if outcome.selected_file.as_deref() == Some(name.as_str()) {
            writeln!(f, "     - {}  {}", name, SEARCHED_MARKER.cyan())?;
        } else {
            writeln!(f, "     - {}", name)?;
        }
    }
    if let Some(selected) = &outcome.selected_file {
        match outcome.selected_file_modified_at {
            Some(modified) => writeln!(
                f,
                "   Searched: {} (modified {})",
                selected,
                humantime::format_rfc3339_seconds(modified)
            )?,
            None => writeln!(f, "   Searched: {}", selected)?,
        }
    }
    if let Some(details) = &outcome.match_details {
        writeln!(
            f,
            "   Matches ({}): {}",
            details.total(),
            details.to_string().green()
        )?;
    }
    Ok(())
}

fn status_text(outcome: &FolderOutcome) -> String {
    match &outcome.search_status {
        SearchStatus::NotSearched => "no supported files".to_string(),
        SearchStatus::NoMatch | SearchStatus::Matched => "no match".to_string(),
        SearchStatus::Failed(reason) => format!("no match, could not read: {}", reason),
    }
}

/// Pretty printed JSON of the whole report
pub fn to_json(report: &ScanReport) -> Result<String, ScanError> {
    Ok(serde_json::to_string_pretty(report)?)
}
