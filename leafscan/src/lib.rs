//! Finds the "final" folders of a directory tree, picks the most recently
//! modified document in each one and reports where a search term occurs in
//! it as a whole word.
//!
//! A folder is final when all of its subfolders (if any) are skip folders
//! such as `Old` or `Test`. Spreadsheets (`.xlsx`, `.xls`), word processor
//! documents (`.docx`) and delimited text (`.csv`) are read locally; cloud
//! document stubs (`.gsheet`, `.gdoc`) are read through a
//! `RemoteDocumentSource` when one is registered.
pub mod config;
pub mod discovery;
pub mod errors;
pub mod extract;
pub mod metrics;
pub mod paths;
pub mod recency;
pub mod results;
pub mod search;

#[cfg(test)]
mod test_support;

pub use config::{CliOverrides, ScanConfig};
pub use discovery::SkipSet;
pub use errors::{ScanError, ScanResult};
pub use extract::{ContentExtractor, ExtractorRegistry, Fragment, Fragments, RemoteDocumentSource};
pub use metrics::ScanMetrics;
pub use results::{FolderOutcome, MatchSummary, ScanReport, SearchStatus, MATCH_DISPLAY_CAP};
pub use search::{MatchEngine, Scanner};
