use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ContentExtractor, ExtractResult, Fragments};
use crate::errors::ScanError;

/// Kind of cloud document a stub file points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteKind {
    Spreadsheet,
    Document,
}

impl RemoteKind {
    /// Extension of the local stub file synced for this kind
    pub fn extension(self) -> &'static str {
        match self {
            RemoteKind::Spreadsheet => ".gsheet",
            RemoteKind::Document => ".gdoc",
        }
    }
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteKind::Spreadsheet => write!(f, "spreadsheet"),
            RemoteKind::Document => write!(f, "document"),
        }
    }
}

/// What a remote lookup needs to find the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub kind: RemoteKind,
    /// File title, i.e. the stub's file name without extension
    pub title: String,
    /// Document id recorded in the stub, when present
    pub doc_id: Option<String>,
}

/// An authenticated, read-only connection to a cloud document service.
///
/// Implementations return fragments labelled the same way as local files
/// (`Sheet '<name>', Cell B4`, `Paragraph 3`, ...). Any failure, including a
/// missing session, is returned as an error and only affects that file.
pub trait RemoteDocumentSource: Send + Sync {
    fn fetch(&self, request: &RemoteRequest) -> ExtractResult<Fragments>;
}

/// Stub files synced by desktop clients are small JSON documents
#[derive(Debug, Deserialize)]
struct StubFile {
    #[serde(default)]
    doc_id: Option<String>,
}

/// Resolves `.gsheet` / `.gdoc` stubs through a `RemoteDocumentSource`
#[derive(Clone)]
pub struct RemoteDocumentExtractor {
    kind: RemoteKind,
    source: Arc<dyn RemoteDocumentSource>,
}

impl RemoteDocumentExtractor {
    pub fn new(kind: RemoteKind, source: Arc<dyn RemoteDocumentSource>) -> Self {
        Self { kind, source }
    }

    fn request_for(&self, path: &Path) -> ExtractResult<RemoteRequest> {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| ScanError::extraction(path, "stub file has no name"))?;

        let raw = std::fs::read_to_string(path).map_err(|e| ScanError::from_io(path, e))?;
        let doc_id = match serde_json::from_str::<StubFile>(&raw) {
            Ok(stub) => stub.doc_id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("Unreadable {} stub {}: {}", self.kind, path.display(), e);
                None
            }
        };

        Ok(RemoteRequest {
            kind: self.kind,
            title,
            doc_id,
        })
    }
}

impl ContentExtractor for RemoteDocumentExtractor {
    fn name(&self) -> &'static str {
        match self.kind {
            RemoteKind::Spreadsheet => "remote-spreadsheet",
            RemoteKind::Document => "remote-document",
        }
    }

    fn extract(&self, path: &Path) -> ExtractResult<Fragments> {
        let request = self.request_for(path)?;
        debug!("Looking up remote {} '{}'", request.kind, request.title);
        self.source
            .fetch(&request)
            .map_err(|e| ScanError::extraction(path, e))
    }
}
