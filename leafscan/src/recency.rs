use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

use crate::extract::ExtractorRegistry;

/// A supported file found directly inside a final folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub name: String,
    /// `None` when the file's metadata could not be read
    pub modified: Option<SystemTime>,
}

impl CandidateFile {
    /// Builds a candidate, reading its modification time from disk
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self {
            path,
            name,
            modified,
        }
    }
}

/// Supported files directly inside `folder` (not recursive), sorted by name.
/// An unreadable folder has no candidates.
pub fn list_candidates(folder: &Path, registry: &ExtractorRegistry) -> Vec<CandidateFile> {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list files in {}: {}", folder.display(), e);
            return Vec::new();
        }
    };

    let mut candidates: Vec<CandidateFile> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .map(|entry| entry.path())
        .filter(|path| registry.is_supported(path))
        .map(CandidateFile::from_path)
        .collect();
    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    trace!("{} candidate(s) in {}", candidates.len(), folder.display());
    candidates
}

/// The most recently modified file. On equal timestamps the earliest file
/// in `files` wins, so the result only depends on the input order. Files
/// without a readable timestamp are never selected.
pub fn select_most_recent(files: &[CandidateFile]) -> Option<&CandidateFile> {
    let mut best: Option<(&CandidateFile, SystemTime)> = None;
    for file in files {
        let Some(modified) = file.modified else {
            continue;
        };
        match best {
            Some((_, current)) if modified <= current => {}
            _ => best = Some((file, modified)),
        }
    }
    best.map(|(file, _)| file)
}
