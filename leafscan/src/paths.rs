use std::path::{Path, PathBuf};

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

/// Whether the input already names an absolute location: `/x`, `\\server`, or `C:`
pub fn is_absolute_input(input: &str) -> bool {
    if input.starts_with('/') || input.starts_with(r"\\") {
        return true;
    }
    let mut chars = input.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}

/// Turns a user supplied root into the path to scan.
///
/// Inputs under `network_prefix` (e.g. `G:\My Drive\Clients`) are rewritten
/// relative to `base_path` with forward slashes. Absolute inputs are kept.
/// Anything else is joined onto `base_path` when one is configured.
/// Returns `None` for blank input.
pub fn resolve_root(
    input: &str,
    base_path: Option<&Path>,
    network_prefix: Option<&str>,
) -> Option<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(rest) = network_prefix.and_then(|prefix| strip_prefix_ignore_case(input, prefix)) {
        let relative = rest.replace('\\', "/");
        let relative = relative.trim_matches('/');
        return Some(match base_path {
            Some(base) if relative.is_empty() => base.to_path_buf(),
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        });
    }

    if is_absolute_input(input) {
        return Some(PathBuf::from(input));
    }

    match base_path {
        Some(base) if !base.as_os_str().is_empty() => Some(base.join(input)),
        _ => Some(PathBuf::from(input)),
    }
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches(['\\', '/']);
    if prefix.is_empty() || input.len() < prefix.len() || !input.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = input.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    // the prefix must end on a path component
    if rest.is_empty() || rest.starts_with(['\\', '/']) {
        Some(rest)
    } else {
        None
    }
}

/// Case-insensitive key used to order folders for presentation
pub fn sort_key(path: &Path) -> (String, String) {
    let display = path.to_string_lossy();
    (display.to_lowercase(), display.into_owned())
}
