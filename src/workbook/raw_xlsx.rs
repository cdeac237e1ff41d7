//! Last-resort back end: opens the workbook as a plain ZIP archive and
//! parses the OOXML parts directly with quick-xml, without any higher-level
//! spreadsheet library. Resolves shared-string references, decodes A1 cell
//! addresses and expands merged ranges into the uniform grid.

use crate::helpers::reader::SourceBuffer;
use crate::helpers::xml::{XmlNodeHelper, XmlReader, XmlTextContextHelper};
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::workbook::grid::{
    iso_to_datetime, serial_to_datetime, CellGrid, CellValue, GridBuilder, MergedRange,
};
use crate::workbook::reference::reference_to_index;
use crate::workbook::{LoadError, SheetGrid, WorkbookBackend};
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use std::io::Cursor;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names of the OOXML parts this backend touches.
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_SHEET: QName = QName(b"sheet");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_TEXT: QName = QName(b"t");
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");
const TAG_MERGE_CELL: QName = QName(b"mergeCell");

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;
type PartReader<'a, 'b> = XmlReader<BufReader<ZipFile<'a, Cursor<&'b [u8]>>>>;

pub(crate) struct RawXlsxBackend;

impl WorkbookBackend for RawXlsxBackend {
    fn name(&self) -> &'static str {
        "raw-xlsx"
    }

    fn load(&self, source: &SourceBuffer) -> Result<Vec<SheetGrid>, LoadError> {
        let mut zip = ZipArchive::new(source.cursor())?;
        let relationships = load_relationships(&mut zip, "xl/_rels/workbook.xml.rels")?;
        let (sheets, is_1904) = load_workbook(&mut zip, &relationships)?;
        if sheets.is_empty() {
            return Err(LoadError::ArchiveError(
                "workbook declares no sheets".to_owned(),
            ));
        }

        let shared_strings = load_shared_strings(&mut zip)?;
        let date_styles = load_date_styles(&mut zip)?;

        let mut grids = Vec::<SheetGrid>::new();
        for (sheet_name, zip_path) in sheets {
            let grid = read_sheet(&mut zip, &zip_path, &shared_strings, &date_styles, is_1904)?;
            grids.push(SheetGrid {
                name: sheet_name,
                grid,
            });
        }
        Ok(grids)
    }
}

/// Loads worksheet relationships: relationship id to part path.
fn load_relationships(zip: &mut Archive<'_>, path: &str) -> Result<HashMap<String, String>, LoadError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| LoadError::MissingPartError(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Parses `xl/workbook.xml`: sheet names with their part paths, plus the
/// 1900/1904 date system flag.
fn load_workbook(
    zip: &mut Archive<'_>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<(String, String)>, bool), LoadError> {
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| LoadError::MissingPartError("xl/workbook.xml".to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads the shared-string table; absent part means no shared strings.
fn load_shared_strings(zip: &mut Archive<'_>) -> Result<Vec<String>, LoadError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Builds a per-style "is this a date format" table from `xl/styles.xml`.
/// Only date detection is needed here: a date-formatted numeric cell must
/// be converted from its serial number, everything else stays numeric.
fn load_date_styles(zip: &mut Archive<'_>) -> Result<Vec<bool>, LoadError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_date_formats = HashMap::<String, bool>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_date_formats.insert(id.to_string(), is_date_format(&format));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.get_attribute_value("numFmtId")? {
                format_indexes.push(id.to_string());
            }
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_date_formats
                .get(id)
                .copied()
                .unwrap_or_else(|| is_builtin_date_format(id))
        })
        .collect())
}

/// Built-in number format ids that render as calendar dates.
fn is_builtin_date_format(id: &str) -> bool {
    matches!(id.parse::<u32>(), Ok(14..=17) | Ok(22))
}

/// Scans a custom format code for date placeholders, skipping escaped
/// characters, quoted literals and color/condition blocks.
fn is_date_format(format: &str) -> bool {
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut is_color = false;
    for character in format.chars() {
        match character {
            _ if is_escaped => is_escaped = false,
            '_' | '\\' if !is_escaped => is_escaped = true,

            '"' if is_literal => is_literal = false,
            '"' if !is_literal && !is_color => is_literal = true,

            ']' if is_color => is_color = false,
            '[' if !is_color && !is_literal => is_color = true,
            _ if is_literal || is_color => (),

            'Y' | 'y' | 'D' | 'd' => return true,
            _ => (),
        }
    }
    false
}

/// Value interpretation for a pending cell, from its `t`/`s` attributes.
#[derive(Clone, Copy, PartialEq)]
enum RawCellType {
    Skip,
    Number,
    DateNumber,
    SharedString,
    InlineString,
    IsoDateTime,
    Boolean,
}

/// Streams one worksheet part into a cell grid.
fn read_sheet(
    zip: &mut Archive<'_>,
    zip_path: &str,
    shared_strings: &[String],
    date_styles: &[bool],
    is_1904: bool,
) -> Result<CellGrid, LoadError> {
    let mut reader = zip
        .xml_reader(zip_path)?
        .ok_or_else(|| LoadError::MissingPartError(zip_path.to_owned()))?;

    let mut builder = GridBuilder::new();
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = RawCellType::Skip;
    let mut value = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            // Cells without an explicit reference continue the current row.
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count += 1;
            kind = event.get_attribute_value("t")?.map(|t| {
                match t.as_ref() {
                    "inlineStr" | "str" => RawCellType::InlineString,
                    "s" => RawCellType::SharedString,
                    "d" => RawCellType::IsoDateTime,
                    "b" => RawCellType::Boolean,
                    "e" => RawCellType::Skip,
                    _ => RawCellType::Number,
                }
            }).unwrap_or(RawCellType::Number);
            if kind == RawCellType::Number {
                if let Some(style) = event.get_attribute_value("s")? {
                    let is_date = style
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| date_styles.get(index).copied())
                        .unwrap_or(false);
                    if is_date {
                        kind = RawCellType::DateNumber;
                    }
                }
            }
            value.clear();
        }
        Event::Start(event) if kind != RawCellType::Skip && event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if kind != RawCellType::Skip && event.name() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL => {
            if kind != RawCellType::Skip && !value.is_empty() {
                if let Some(cell) = convert(kind, &value, shared_strings, is_1904) {
                    builder.push(row, col, cell);
                }
            }
            kind = RawCellType::Skip;
        }
        Event::Start(event) if event.name() == TAG_MERGE_CELL => {
            if let Some(reference) = event.get_attribute_value("ref")? {
                if let Some(range) = parse_merge_range(&reference) {
                    builder.merge(range);
                }
            }
        }
    });

    Ok(builder.build())
}

/// Converts collected cell text to a typed value. Unresolvable content
/// (bad shared-string index, unparseable number) degrades to text or
/// nothing rather than failing the whole sheet: this backend is the last
/// line of defense.
fn convert(
    kind: RawCellType,
    value: &str,
    shared_strings: &[String],
    is_1904: bool,
) -> Option<CellValue> {
    match kind {
        RawCellType::Skip => None,
        RawCellType::SharedString => {
            let index = value.trim().parse::<usize>().ok()?;
            let text = shared_strings.get(index)?;
            (!text.is_empty()).then(|| CellValue::Text(text.to_owned()))
        }
        RawCellType::InlineString => {
            (!value.is_empty()).then(|| CellValue::Text(value.to_owned()))
        }
        RawCellType::IsoDateTime => Some(
            iso_to_datetime(value)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(value.to_owned())),
        ),
        RawCellType::Boolean => Some(CellValue::Text(
            if value == "1" { "true" } else { "false" }.to_owned(),
        )),
        RawCellType::Number | RawCellType::DateNumber => match value.trim().parse::<f64>() {
            Ok(number) if kind == RawCellType::DateNumber => Some(
                serial_to_datetime(number, is_1904)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(number)),
            ),
            Ok(number) => Some(CellValue::Number(number)),
            Err(_) => Some(CellValue::Text(value.to_owned())),
        },
    }
}

/// Parses a `mergeCell` reference like `"B1:C2"` into a 0-based range.
fn parse_merge_range(reference: &str) -> Option<MergedRange> {
    let (first, last) = reference.split_once(':')?;
    let (first_row, first_col) = reference_to_index(first.trim())?;
    let (last_row, last_col) = reference_to_index(last.trim())?;
    (first_row <= last_row && first_col <= last_col).then_some(MergedRange {
        first_row,
        first_col,
        last_row,
        last_col,
    })
}

/// Reads string content up to `end_tag`, collecting text inside `<t>`
/// elements (or everything when `is_text_content` is set, as for `<v>`).
fn read_string_value(
    reader: &mut PartReader<'_, '_>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, LoadError> {
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

/// Normalizes a relationship target into a path inside the archive.
fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix("/xl/") {
        format!("xl/{stripped}")
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
