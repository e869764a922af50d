//! Builders for small office files used by the unit tests.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_zip(path: &Path, entries: &[(&str, String)]) -> std::io::Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}

/// Writes a one-sheet workbook. Cells are `(row, column, text)`, zero-based.
pub fn write_xlsx(path: &Path, sheet: &str, cells: &[(u32, u32, &str)]) -> std::io::Result<()> {
    let mut rows: BTreeMap<u32, Vec<(u32, usize)>> = BTreeMap::new();
    let mut strings = Vec::new();
    for (row, col, text) in cells {
        rows.entry(*row).or_default().push((*col, strings.len()));
        strings.push(escape_xml(text));
    }

    let mut sheet_data = String::new();
    for (row, mut cols) in rows {
        cols.sort();
        sheet_data.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, index) in cols {
            sheet_data.push_str(&format!(
                r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
                crate::extract::column_letters(col),
                row + 1,
                index
            ));
        }
        sheet_data.push_str("</row>");
    }

    let shared: String = strings
        .iter()
        .map(|s| format!("<si><t>{}</t></si>", s))
        .collect();

    write_zip(
        path,
        &[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
                    PACKAGE_REL_NS, RELATIONSHIP_NS
                ),
            ),
            (
                "xl/workbook.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                    SPREADSHEET_NS,
                    RELATIONSHIP_NS,
                    escape_xml(sheet)
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{0}"><Relationship Id="rId1" Type="{1}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{1}/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#,
                    PACKAGE_REL_NS, RELATIONSHIP_NS
                ),
            ),
            (
                "xl/sharedStrings.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{}" count="{2}" uniqueCount="{2}">{1}</sst>"#,
                    SPREADSHEET_NS,
                    shared,
                    strings.len()
                ),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{}"><sheetData>{}</sheetData></worksheet>"#,
                    SPREADSHEET_NS, sheet_data
                ),
            ),
        ],
    )
}

/// `<w:p>` containing `text` as a single run
pub fn docx_paragraph(text: &str) -> String {
    if text.is_empty() {
        return "<w:p/>".to_string();
    }
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}

/// `<w:tbl>` with one paragraph per cell
pub fn docx_table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl><w:tblPr/>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str(&format!("<w:tc><w:tcPr/>{}</w:tc>", docx_paragraph(cell)));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// Writes a minimal `.docx` whose body is `body_xml`
pub fn write_docx(path: &Path, body_xml: &str) -> std::io::Result<()> {
    write_zip(
        path,
        &[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_string(),
            ),
            (
                "word/document.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                    WORD_NS, body_xml
                ),
            ),
        ],
    )
}
