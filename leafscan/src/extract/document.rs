use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;
use zip::ZipArchive;

use super::{ContentExtractor, ExtractResult, Fragment, Fragments};
use crate::errors::ScanError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads `.docx` files: body paragraphs and top-level table cells
#[derive(Debug, Default, Clone, Copy)]
pub struct WordDocumentExtractor;

impl ContentExtractor for WordDocumentExtractor {
    fn name(&self) -> &'static str {
        "word-processor"
    }

    fn extract(&self, path: &Path) -> ExtractResult<Fragments> {
        let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| ScanError::extraction(path, e))?;
        let part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| ScanError::extraction(path, e))?;

        let fragments =
            parse_document(BufReader::new(part)).map_err(|e| ScanError::extraction(path, e))?;
        trace!(
            "Read {} fragment(s) from {}",
            fragments.len(),
            path.display()
        );
        Ok(Box::new(fragments.into_iter().map(Ok)))
    }
}

/// Walks `word/document.xml` and collects labelled paragraphs and cells.
///
/// Paragraph numbers count every body paragraph, empty ones included.
/// Paragraphs inside tables belong to their cell. Nested tables are folded
/// into the text of the enclosing top-level cell.
fn parse_document<R: std::io::BufRead>(source: R) -> Result<Vec<Fragment>, quick_xml::Error> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut fragments = Vec::new();

    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut in_text = false;

    let mut paragraph_count = 0usize;
    let mut paragraph_text = String::new();

    let mut table_count = 0usize;
    let mut row = 0usize;
    let mut column = 0usize;
    let mut cell_paragraphs = 0usize;
    let mut cell_text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table_count += 1;
                        row = 0;
                    }
                }
                b"tr" if table_depth == 1 => {
                    row += 1;
                    column = 0;
                }
                b"tc" if table_depth == 1 => {
                    column += 1;
                    cell_paragraphs = 0;
                    cell_text.clear();
                }
                b"p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        if table_depth == 0 {
                            paragraph_text.clear();
                        } else if table_depth == 1 {
                            if cell_paragraphs > 0 {
                                cell_text.push('\n');
                            }
                            cell_paragraphs += 1;
                        }
                    }
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" if paragraph_depth == 0 => {
                    if table_depth == 0 {
                        paragraph_count += 1;
                    } else if table_depth == 1 {
                        if cell_paragraphs > 0 {
                            cell_text.push('\n');
                        }
                        cell_paragraphs += 1;
                    }
                }
                b"tc" if table_depth == 1 => column += 1,
                name @ (b"tab" | b"br" | b"cr") if paragraph_depth > 0 => {
                    let ch = if name == b"tab" { '\t' } else { '\n' };
                    if table_depth == 0 {
                        paragraph_text.push(ch);
                    } else {
                        cell_text.push(ch);
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape()?;
                if table_depth == 0 {
                    paragraph_text.push_str(&text);
                } else {
                    cell_text.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if paragraph_depth == 1 && table_depth == 0 {
                        paragraph_count += 1;
                        if !paragraph_text.trim().is_empty() {
                            fragments.push(Fragment::new(
                                format!("Paragraph {}", paragraph_count),
                                paragraph_text.clone(),
                            ));
                        }
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"tc" if table_depth == 1 => {
                    if !cell_text.trim().is_empty() {
                        fragments.push(Fragment::new(
                            format!("Table {}, Row {}, Cell {}", table_count, row, column),
                            cell_text.clone(),
                        ));
                    }
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{docx_paragraph, docx_table, write_docx};
    use tempfile::tempdir;

    fn extract_all(path: &Path) -> Vec<Fragment> {
        WordDocumentExtractor
            .extract(path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_paragraph_numbers_count_empty_paragraphs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        let body = [
            docx_paragraph("Dear client,"),
            docx_paragraph(""),
            docx_paragraph("   "),
            docx_paragraph("Regards, Anna"),
        ]
        .concat();
        write_docx(&path, &body).unwrap();

        let fragments = extract_all(&path);
        assert_eq!(
            fragments,
            vec![
                Fragment::new("Paragraph 1", "Dear client,"),
                Fragment::new("Paragraph 4", "Regards, Anna"),
            ]
        );
    }

    #[test]
    fn test_table_cells_are_labelled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tables.docx");
        let body = [
            docx_paragraph("Intro"),
            docx_table(&[&["Name", "City"], &["Anna", ""]]),
            docx_paragraph("Between"),
            docx_table(&[&["x", "y", "Lee"]]),
        ]
        .concat();
        write_docx(&path, &body).unwrap();

        let labels: Vec<String> = extract_all(&path).into_iter().map(|f| f.label).collect();
        assert_eq!(
            labels,
            vec![
                "Paragraph 1",
                "Table 1, Row 1, Cell 1",
                "Table 1, Row 1, Cell 2",
                "Table 1, Row 2, Cell 1",
                "Paragraph 2",
                "Table 2, Row 1, Cell 1",
                "Table 2, Row 1, Cell 2",
                "Table 2, Row 1, Cell 3",
            ]
        );
    }

    #[test]
    fn test_fragments_outlive_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memo.docx");
        let body = [docx_paragraph("Anna"), docx_paragraph("Lee")].concat();
        write_docx(&path, &body).unwrap();

        let fragments = WordDocumentExtractor.extract(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let labels: Vec<String> = fragments.map(|f| f.unwrap().label).collect();
        assert_eq!(labels, vec!["Paragraph 1", "Paragraph 2"]);
    }

    #[test]
    fn test_runs_tabs_and_entities() {
        let body = r#"<w:p><w:r><w:t>Smith &amp; </w:t></w:r><w:r><w:tab/><w:t>Anna</w:t><w:br/><w:t>Lee</w:t></w:r></w:p>"#;
        let xml = format!(
            r#"<w:document xmlns:w="urn:w"><w:body>{}</w:body></w:document>"#,
            body
        );
        let fragments = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(
            fragments,
            vec![Fragment::new("Paragraph 1", "Smith & \tAnna\nLee")]
        );
    }

    #[test]
    fn test_multi_paragraph_cell_joins_with_newline() {
        let body = r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>one</w:t></w:r></w:p><w:p><w:r><w:t>two</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
        let xml = format!(
            r#"<w:document xmlns:w="urn:w"><w:body>{}</w:body></w:document>"#,
            body
        );
        let fragments = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(
            fragments,
            vec![Fragment::new("Table 1, Row 1, Cell 1", "one\ntwo")]
        );
    }

    #[test]
    fn test_missing_document_part() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.finish().unwrap();

        let result = WordDocumentExtractor.extract(&path);
        assert!(matches!(result, Err(ScanError::Extraction { .. })));
    }
}
