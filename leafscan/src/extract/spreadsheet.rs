use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::trace;

use super::{column_letters, ContentExtractor, ExtractResult, Fragment, Fragments};
use crate::errors::ScanError;

/// Reads `.xlsx` and `.xls` workbooks, one fragment per non-empty cell
#[derive(Debug, Default, Clone, Copy)]
pub struct SpreadsheetExtractor;

impl ContentExtractor for SpreadsheetExtractor {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn extract(&self, path: &Path) -> ExtractResult<Fragments> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ScanError::extraction(path, e))?;

        let path = path.to_path_buf();
        let sheets: Vec<(String, ExtractResult<Range<Data>>)> = workbook
            .sheet_names()
            .into_iter()
            .map(|name| {
                let range = workbook
                    .worksheet_range(&name)
                    .map_err(|e| ScanError::extraction(&path, e));
                (name, range)
            })
            .collect();
        trace!("Loaded {} sheet(s) from {}", sheets.len(), path.display());

        Ok(Box::new(sheets.into_iter().flat_map(
            |(name, range)| -> Vec<ExtractResult<Fragment>> {
                match range {
                    Ok(range) => sheet_fragments(&name, &range)
                        .into_iter()
                        .map(Ok)
                        .collect(),
                    Err(e) => vec![Err(e)],
                }
            },
        )))
    }
}

/// Labels every non-empty cell of one sheet with its absolute coordinate
fn sheet_fragments(sheet: &str, range: &Range<Data>) -> Vec<Fragment> {
    let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
    range
        .cells()
        .filter(|(_, _, value)| !matches!(value, Data::Empty))
        .filter_map(|(row, col, value)| {
            let text = value.to_string();
            if text.is_empty() {
                return None;
            }
            let label = format!(
                "Sheet '{}', Cell {}{}",
                sheet,
                column_letters(col_offset + col as u32),
                row_offset as usize + row + 1
            );
            Some(Fragment::new(label, text))
        })
        .collect()
}
