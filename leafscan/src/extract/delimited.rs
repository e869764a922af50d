use encoding_rs::{Encoding, ISO_8859_15, ISO_8859_2, WINDOWS_1252};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

use super::{ContentExtractor, ExtractResult, Fragment, Fragments};
use crate::errors::ScanError;

/// Single-byte encodings tried, in order, after UTF-8. ISO-8859-15 assigns
/// every byte, so in practice it ends the chain.
fn fallback_encodings() -> [&'static Encoding; 3] {
    [WINDOWS_1252, ISO_8859_15, ISO_8859_2]
}

/// Bytes windows-1252 leaves unassigned. encoding_rs maps them to C1
/// controls, so they are rejected here instead.
const WINDOWS_1252_UNASSIGNED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    if encoding == WINDOWS_1252 && bytes.iter().any(|b| WINDOWS_1252_UNASSIGNED.contains(b)) {
        return None;
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

/// Reads delimited text (`.csv`). Every non-blank line becomes a `Row <n>`
/// fragment with one `Row <n>, Column <c>` part per cell.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedTextExtractor {
    delimiter: char,
}

impl DelimitedTextExtractor {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl Default for DelimitedTextExtractor {
    fn default() -> Self {
        Self::new(',')
    }
}

impl ContentExtractor for DelimitedTextExtractor {
    fn name(&self) -> &'static str {
        "delimited-text"
    }

    fn extract(&self, path: &Path) -> ExtractResult<Fragments> {
        let bytes = std::fs::read(path).map_err(|e| ScanError::from_io(path, e))?;
        let text = decode_text(&bytes, path);
        let delimiter = self.delimiter;

        let rows: Vec<(usize, String)> = split_lines(&text)
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (index + 1, line.to_string()))
            .collect();

        Ok(Box::new(
            rows.into_iter()
                .map(move |(row, line)| Ok(row_fragment(row, line, delimiter))),
        ))
    }
}

fn row_fragment(row: usize, line: String, delimiter: char) -> Fragment {
    let cells = line
        .split(delimiter)
        .enumerate()
        .filter(|(_, cell)| !cell.trim().is_empty())
        .map(|(index, cell)| Fragment::new(format!("Row {}, Column {}", row, index + 1), cell))
        .collect();
    Fragment::new(format!("Row {}", row), line).with_parts(cells)
}

/// Decodes file bytes, trying UTF-8 (dropping a leading signature) and then
/// the single-byte fallbacks. If nothing decodes cleanly, invalid bytes are dropped.
pub fn decode_text(bytes: &[u8], path: &Path) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.strip_prefix('\u{feff}').unwrap_or(text).to_string();
    }
    for encoding in fallback_encodings() {
        if let Some(text) = decode_strict(encoding, bytes) {
            debug!("Decoded {} as {}", path.display(), encoding.name());
            return text;
        }
    }

    warn!("Dropping undecodable bytes in {}", path.display());
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => text.replace(char::REPLACEMENT_CHARACTER, ""),
    }
}

/// Splits on `\n`, `\r\n` and lone `\r`
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(pos) => {
                let skip = if current[pos..].starts_with("\r\n") {
                    2
                } else {
                    1
                };
                rest = Some(&current[pos + skip..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                if current.is_empty() {
                    None
                } else {
                    Some(current)
                }
            }
        }
    })
}
