//! Format-specific text extraction.
//!
//! Every supported format turns a file into a finite, consume-once sequence
//! of labelled text fragments. Workbooks and Word documents are parsed in
//! full before the first fragment is yielded; delimited text builds each row
//! fragment as it is consumed. Extraction is best effort: a failure is
//! reported as an `Err` (for the whole file or for one item) and the caller
//! decides what that means for the folder being searched.
pub mod delimited;
pub mod document;
pub mod remote;
pub mod spreadsheet;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::normalize_extension;
use crate::errors::{ScanError, ScanResult};

pub use delimited::DelimitedTextExtractor;
pub use document::WordDocumentExtractor;
pub use remote::{RemoteDocumentExtractor, RemoteDocumentSource, RemoteKind};
pub use spreadsheet::SpreadsheetExtractor;

/// Result type for extraction
pub type ExtractResult<T> = ScanResult<T>;

/// Fragments produced by one extraction, possibly materialized up front
pub type Fragments = Box<dyn Iterator<Item = ExtractResult<Fragment>> + Send>;

/// A piece of text and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Human readable location, e.g. `Sheet 'Q1', Cell B4`
    pub label: String,
    /// Text found at that location
    pub text: String,
    /// Finer grained pieces of `text` used to pin a match to one location
    pub parts: Vec<Fragment>,
}

impl Fragment {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            parts: Vec::new(),
        }
    }

    pub fn with_parts(mut self, parts: Vec<Fragment>) -> Self {
        self.parts = parts;
        self
    }
}

/// Turns one file of a given format into labelled fragments
pub trait ContentExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Opens `path` and returns its fragments
    fn extract(&self, path: &Path) -> ExtractResult<Fragments>;
}

/// Maps lowercase dotted extensions to their extractor
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<String, Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Creates a registry with no formats
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in local format
    pub fn with_defaults() -> Self {
        let spreadsheet: Arc<dyn ContentExtractor> = Arc::new(SpreadsheetExtractor);
        let mut registry = Self::new();
        registry.register(".xlsx", Arc::clone(&spreadsheet));
        registry.register(".xls", spreadsheet);
        registry.register(".docx", Arc::new(WordDocumentExtractor));
        registry.register(".csv", Arc::new(DelimitedTextExtractor::default()));
        registry
    }

    /// Adds the remote document formats backed by `source`
    pub fn with_remote(mut self, source: Arc<dyn RemoteDocumentSource>) -> Self {
        for kind in [RemoteKind::Spreadsheet, RemoteKind::Document] {
            self.register(
                kind.extension(),
                Arc::new(RemoteDocumentExtractor::new(kind, Arc::clone(&source))),
            );
        }
        self
    }

    /// Registers (or replaces) the extractor for an extension
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn ContentExtractor>) {
        self.extractors
            .insert(normalize_extension(extension), extractor);
    }

    /// Keeps only the listed extensions. Naming an extension the registry
    /// does not know is a configuration error, as is ending up with none.
    pub fn restrict_to(mut self, extensions: &[String]) -> ScanResult<Self> {
        let wanted: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();
        if let Some(unknown) = wanted.iter().find(|e| !self.extractors.contains_key(*e)) {
            return Err(ScanError::config_error(format!(
                "no extractor available for '{}' (supported: {})",
                unknown,
                self.extensions().join(", ")
            )));
        }
        self.extractors.retain(|ext, _| wanted.contains(ext));
        self.ensure_usable()?;
        Ok(self)
    }

    /// Fails when no format can be searched at all
    pub fn ensure_usable(&self) -> ScanResult<()> {
        if self.extractors.is_empty() {
            return Err(ScanError::config_error("no content extractors are enabled"));
        }
        Ok(())
    }

    /// Extractor responsible for `path`, by extension
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn ContentExtractor>> {
        let ext = path.extension()?.to_str()?;
        self.extractors.get(&normalize_extension(ext))
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    /// Registered extensions in sorted order
    pub fn extensions(&self) -> Vec<String> {
        self.extractors.keys().cloned().collect()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.extractors.iter().map(|(ext, x)| (ext, x.name())))
            .finish()
    }
}

/// Spreadsheet column letters for a zero-based index: 0 -> A, 26 -> AA
pub fn column_letters(index: u32) -> String {
    let mut n = index as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_default_registry() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(
            registry.extensions(),
            vec![".csv", ".docx", ".xls", ".xlsx"]
        );
        assert!(registry.is_supported(Path::new("a/Report.XLSX")));
        assert!(registry.is_supported(Path::new("notes.docx")));
        assert!(!registry.is_supported(Path::new("notes.doc")));
        assert!(!registry.is_supported(Path::new("README")));
        assert!(!registry.is_supported(Path::new("sheet.gsheet")));
        assert_eq!(
            registry.for_path(Path::new("old.xls")).map(|x| x.name()),
            Some("spreadsheet")
        );
    }

    #[test]
    fn test_restrict_to() {
        let registry = ExtractorRegistry::with_defaults()
            .restrict_to(&["XLSX".to_string(), ".csv".to_string()])
            .unwrap();
        assert_eq!(registry.extensions(), vec![".csv", ".xlsx"]);
        assert!(!registry.is_supported(Path::new("a.docx")));
    }

    #[test]
    fn test_restrict_to_unknown_extension() {
        let result = ExtractorRegistry::with_defaults().restrict_to(&[".pdf".to_string()]);
        assert!(matches!(result, Err(ScanError::ConfigError(_))));
    }

    #[test]
    fn test_restrict_to_nothing() {
        let result = ExtractorRegistry::with_defaults().restrict_to(&[]);
        assert!(matches!(result, Err(ScanError::ConfigError(_))));
    }

    #[test]
    fn test_empty_registry_is_not_usable() {
        assert!(ExtractorRegistry::new().ensure_usable().is_err());
        assert!(ExtractorRegistry::with_defaults().ensure_usable().is_ok());
    }
}
