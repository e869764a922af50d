use ignore::WalkBuilder;
use std::collections::{BTreeSet, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::DEFAULT_SKIP_FOLDERS;
use crate::errors::{ScanError, ScanResult};

/// Folder names (case-insensitive) that are never classified or descended into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSet {
    names: HashSet<String>,
}

impl SkipSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Whether a folder with this name ends descent
    pub fn contains(&self, name: &OsStr) -> bool {
        name.to_str()
            .is_some_and(|n| self.names.contains(&n.to_lowercase()))
    }

    /// Whether the last component of `path` is a skip folder
    pub fn is_skip_folder(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.contains(name))
    }
}

impl Default for SkipSet {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_FOLDERS)
    }
}

/// Checks that a root can be walked
pub fn validate_root(root: &Path) -> ScanResult<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::not_a_directory(root)),
        Err(e) => Err(ScanError::from_io(root, e)),
    }
}

/// Immediate subdirectories of `dir` that are not skip folders, sorted.
/// A directory that cannot be read is treated as having none.
pub fn immediate_subdirectories(dir: &Path, skip: &SkipSet) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_dir()))
        .filter(|entry| !skip.contains(&entry.file_name()))
        .map(|entry| entry.path())
        .collect();
    subdirs.sort();
    subdirs
}

/// A folder is final when every subdirectory it has is a skip folder
pub fn is_final_folder(dir: &Path, skip: &SkipSet) -> bool {
    immediate_subdirectories(dir, skip).is_empty()
}

/// Every final folder at or below `root`.
///
/// Skip folders are pruned before descent, so nothing inside them is ever
/// visited. A root that is itself a skip folder yields nothing. Unreadable
/// directories are treated as leaves.
pub fn classify(root: &Path, skip: &SkipSet) -> ScanResult<BTreeSet<PathBuf>> {
    validate_root(root)?;
    if skip.is_skip_folder(root) {
        debug!("Root {} is a skip folder", root.display());
        return Ok(BTreeSet::new());
    }

    let filter_skip = skip.clone();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_some_and(|ft| ft.is_dir())
                || !filter_skip.contains(entry.file_name())
        })
        .build();

    let mut finals = BTreeSet::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            continue;
        }
        if is_final_folder(entry.path(), skip) {
            trace!("Final folder: {}", entry.path().display());
            finals.insert(entry.into_path());
        }
    }

    debug!(
        "Found {} final folder(s) under {}",
        finals.len(),
        root.display()
    );
    Ok(finals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    fn relative(root: &Path, set: &BTreeSet<PathBuf>) -> Vec<String> {
        set.iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_skip_set_is_case_insensitive() {
        let skip = SkipSet::default();
        assert!(skip.contains(OsStr::new("Old")));
        assert!(skip.contains(OsStr::new("FEASIBILITY")));
        assert!(!skip.contains(OsStr::new("Older")));
        assert!(skip.is_skip_folder(Path::new("/clients/anna/TEST")));
    }

    #[test]
    fn test_only_skip_subfolder_is_final() {
        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["A/Old"]);
        assert!(is_final_folder(&dir.path().join("A"), &SkipSet::default()));
    }

    #[test]
    fn test_non_skip_subfolder_is_not_final() {
        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["A/Drafts"]);
        assert!(!is_final_folder(&dir.path().join("A"), &SkipSet::default()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_folder_is_a_leaf() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["Locked/Inner", "Open"]);
        let locked = dir.path().join("Locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // permission bits are not enforced, e.g. when running as root
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let skip = SkipSet::default();
        let subdirs = immediate_subdirectories(&locked, &skip);
        let is_final = is_final_folder(&locked, &skip);
        let finals = classify(dir.path(), &skip);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(subdirs.is_empty());
        assert!(is_final);
        assert_eq!(
            relative(dir.path(), &finals.unwrap()),
            vec!["Locked", "Open"]
        );
    }

    #[test]
    fn test_classify_walks_full_subtree() {
        let dir = tempdir().unwrap();
        mkdirs(
            dir.path(),
            &[
                "Clients/Anna/2023",
                "Clients/Anna/2024/Old/Inner",
                "Clients/Bob",
                "Clients/Old/Deep/Deeper",
                "Clients/Test",
                "Projects/Empty",
            ],
        );

        let finals = classify(dir.path(), &SkipSet::default()).unwrap();
        assert_eq!(
            relative(dir.path(), &finals),
            vec![
                "Clients/Anna/2023",
                "Clients/Anna/2024",
                "Clients/Bob",
                "Projects/Empty",
            ]
        );
    }

    #[test]
    fn test_root_without_subfolders_is_final() {
        let dir = tempdir().unwrap();
        let finals = classify(dir.path(), &SkipSet::default()).unwrap();
        assert_eq!(finals.len(), 1);
        assert!(finals.contains(dir.path()));
    }

    #[test]
    fn test_skip_root_yields_nothing() {
        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["old/inner"]);
        let finals = classify(&dir.path().join("old"), &SkipSet::default()).unwrap();
        assert!(finals.is_empty());
    }

    #[test]
    fn test_custom_skip_set() {
        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["A/Archive/x", "A/Old/y"]);
        let skip = SkipSet::new(["archive"]);
        let finals = classify(dir.path(), &skip).unwrap();
        assert_eq!(relative(dir.path(), &finals), vec!["A/Old/y"]);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["a/b/c", "a/d", "e/old", "f/g/test/h"]);
        let skip = SkipSet::default();
        let first = classify(dir.path(), &skip).unwrap();
        let second = classify(dir.path(), &skip).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root_is_path_error() {
        let dir = tempdir().unwrap();
        let result = classify(&dir.path().join("nope"), &SkipSet::default());
        assert!(matches!(result, Err(ScanError::PathNotFound(_))));
    }

    #[test]
    fn test_file_root_is_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.csv");
        fs::write(&file, "x").unwrap();
        let result = classify(&file, &SkipSet::default());
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_files_do_not_make_a_folder_non_final() {
        let dir = tempdir().unwrap();
        mkdirs(dir.path(), &["A"]);
        fs::write(dir.path().join("A/old"), "a file named old").unwrap();
        fs::write(dir.path().join("A/report.csv"), "x").unwrap();
        let finals = classify(dir.path(), &SkipSet::default()).unwrap();
        assert_eq!(relative(dir.path(), &finals), vec!["A"]);
    }
}
