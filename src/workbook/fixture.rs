//! Builds minimal but well-formed xlsx archives for tests, so every
//! back end exercises the same real file instead of mocked readers.

use crate::workbook::reference::index_to_reference;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

// Style index 1 carries built-in date format 14 (dd.mm.yyyy).
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="1"><fill><patternFill patternType="none"/></fill></fills>
<borders count="1"><border/></borders>
<cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" xfId="0"/><xf numFmtId="14" xfId="0" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

/// Worksheet body exercising shared strings, merged cells, a date-styled
/// serial number, a plain number and an inline string.
pub(crate) const SHEET_WITH_MERGE_AND_DATE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1"><c r="B1" t="s"><v>0</v></c></row>
<row r="2"><c r="A2" s="1"><v>45901</v></c><c r="B2"><v>301</v></c></row>
<row r="3"><c r="A3" t="inlineStr"><is><t>История</t></is></c></row>
</sheetData>
<mergeCells count="1"><mergeCell ref="B1:C1"/></mergeCells>
</worksheet>"#;

/// Builds an xlsx workbook with a single sheet where every non-empty cell
/// holds the given text as a shared string.
pub(crate) fn workbook_bytes(sheet_name: &str, rows: &[&[&str]]) -> Vec<u8> {
    let mut shared = Vec::<String>::new();
    let mut sheet_rows = String::new();
    for (row_index, row) in rows.iter().enumerate() {
        sheet_rows.push_str(&format!("<row r=\"{}\">", row_index + 1));
        for (col_index, text) in row.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let string_index = shared.len();
            shared.push(escape(text));
            sheet_rows.push_str(&format!(
                "<c r=\"{}\" t=\"s\"><v>{string_index}</v></c>",
                index_to_reference(row_index, col_index)
            ));
        }
        sheet_rows.push_str("</row>");
    }
    let sheet = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{sheet_rows}</sheetData></worksheet>"
    );
    build(sheet_name, &sheet, &shared)
}

/// Builds an xlsx workbook from a hand-written worksheet part and a
/// shared-string table.
pub(crate) fn workbook_bytes_with_parts(
    sheet_name: &str,
    sheet_xml: &str,
    shared_strings: &[&str],
) -> Vec<u8> {
    let shared: Vec<String> = shared_strings.iter().map(|text| escape(text)).collect();
    build(sheet_name, sheet_xml, &shared)
}

/// A valid ZIP archive that is not a workbook at all.
pub(crate) fn empty_zip() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("readme.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"not a workbook").unwrap();
    writer.finish().unwrap().into_inner()
}

fn build(sheet_name: &str, sheet_xml: &str, shared: &[String]) -> Vec<u8> {
    let workbook = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <sheets><sheet name=\"{}\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>",
        escape(sheet_name)
    );
    let shared_items: String = shared
        .iter()
        .map(|text| format!("<si><t xml:space=\"preserve\">{text}</t></si>"))
        .collect();
    let shared_strings = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         count=\"{count}\" uniqueCount=\"{count}\">{shared_items}</sst>",
        count = shared.len()
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let parts: &[(&str, &str)] = &[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/sharedStrings.xml", &shared_strings),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];
    for (path, content) in parts {
        writer.start_file(*path, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
