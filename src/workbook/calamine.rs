//! Primary back end: reads XLSX workbooks through the calamine library.

use crate::helpers::reader::SourceBuffer;
use crate::workbook::grid::{iso_to_datetime, CellValue, GridBuilder, MergedRange};
use crate::workbook::{LoadError, SheetGrid, WorkbookBackend};
use calamine::{Data, Reader, Xlsx};

pub(crate) struct CalamineBackend;

impl WorkbookBackend for CalamineBackend {
    fn name(&self) -> &'static str {
        "calamine"
    }

    fn load(&self, source: &SourceBuffer) -> Result<Vec<SheetGrid>, LoadError> {
        let mut workbook: Xlsx<_> = Xlsx::new(source.cursor())
            .map_err(|error| LoadError::CalamineError(error.to_string()))?;
        workbook
            .load_merged_regions()
            .map_err(|error| LoadError::CalamineError(error.to_string()))?;

        let mut sheets = Vec::<SheetGrid>::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|error| LoadError::CalamineError(error.to_string()))?;

            let mut builder = GridBuilder::new();
            if let Some((start_row, start_col)) = range.start() {
                for (row, col, data) in range.used_cells() {
                    let row = start_row as usize + row;
                    let col = start_col as usize + col;
                    if let Some(value) = convert(data) {
                        builder.push(row, col, value);
                    }
                }
            }

            for (_, _, dimensions) in workbook.merged_regions_by_sheet(&sheet_name) {
                builder.merge(MergedRange {
                    first_row: dimensions.start.0 as usize,
                    first_col: dimensions.start.1 as usize,
                    last_row: dimensions.end.0 as usize,
                    last_col: dimensions.end.1 as usize,
                });
            }

            sheets.push(SheetGrid {
                name: sheet_name.to_owned(),
                grid: builder.build(),
            });
        }

        Ok(sheets)
    }
}

/// Maps a calamine cell onto the uniform value model. Empty cells, error
/// cells and empty strings all collapse to "no value".
fn convert(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(CellValue::Text(text.to_owned())),
        Data::Int(value) => Some(CellValue::Number(*value as f64)),
        Data::Float(value) => Some(CellValue::Number(*value)),
        Data::Bool(value) => Some(CellValue::Text(value.to_string())),
        Data::DateTime(value) => Some(
            value
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Number(value.as_f64())),
        ),
        Data::DateTimeIso(text) => Some(
            iso_to_datetime(text)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(text.to_owned())),
        ),
        Data::DurationIso(text) => Some(CellValue::Text(text.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::fixture;

    #[test]
    fn reads_fixture_workbook() {
        let bytes = fixture::workbook_bytes(
            "2 курс",
            &[&["Б1-24", "ауд."], &["понедельник", ""], &["История", "301"]],
        );
        let source = SourceBuffer::from_bytes(bytes, "fixture.xlsx");
        let sheets = CalamineBackend.load(&source).unwrap();

        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "2 курс");
        assert_eq!(
            sheets[0].grid.value(2, 0),
            &CellValue::Text("История".to_owned())
        );
        assert_eq!(
            sheets[0].grid.value(2, 1),
            &CellValue::Text("301".to_owned())
        );
    }

    #[test]
    fn rejects_non_archive_bytes() {
        let source = SourceBuffer::from_bytes(vec![0, 1, 2, 3], "junk.bin");
        assert!(CalamineBackend.load(&source).is_err());
    }
}
