//! Uniform cell grid produced by every loader backend.
//!
//! Whatever library (or hand-rolled parser) read the workbook, the rest of
//! the engine only ever sees a rectangular [`CellGrid`]: merged ranges are
//! expanded by propagating the anchor value, short rows are padded to the
//! sheet width, and every empty-sentinel representation collapses to
//! [`CellValue::Empty`].

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// A typed cell value after backend normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// An immutable rectangular grid of cell values for one sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGrid {
    rows: Vec<Vec<CellValue>>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellGrid {
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Value at (row, col); positions outside the grid read as empty.
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Parses an ISO 8601 date or datetime string as stored in `t="d"` cells.
pub(crate) fn iso_to_datetime(text: &str) -> Option<NaiveDateTime> {
    if text.contains('T') {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

/// Converts an Excel serial date number to a datetime.
/// Accounts for the Lotus 1-2-3 leap year bug in the 1900 epoch and the
/// alternative 1904 epoch used by some workbooks.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)? + Duration::days(days + offset);
    let seconds = (serial.fract() * 86_400f64).round() as i64;
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight + Duration::seconds(seconds))
}

/// A merged cell range, inclusive on both ends, 0-based.
#[derive(Clone, Copy, Debug)]
pub struct MergedRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

/// Accumulates sparse cells and merged ranges, then builds a dense grid.
#[derive(Default)]
pub struct GridBuilder {
    cells: Vec<(usize, usize, CellValue)>,
    merges: Vec<MergedRange>,
}

impl GridBuilder {
    pub fn new() -> GridBuilder {
        GridBuilder::default()
    }

    pub fn push(&mut self, row: usize, col: usize, value: CellValue) {
        if !value.is_empty() {
            self.cells.push((row, col, value));
        }
    }

    pub fn merge(&mut self, range: MergedRange) {
        self.merges.push(range);
    }

    /// Builds the rectangular grid: dense rows padded to the sheet width,
    /// merged anchors propagated into every covered cell that is empty.
    pub fn build(self) -> CellGrid {
        let mut height = 0usize;
        let mut width = 0usize;
        for (row, col, _) in &self.cells {
            height = height.max(row + 1);
            width = width.max(col + 1);
        }
        for merge in &self.merges {
            height = height.max(merge.last_row + 1);
            width = width.max(merge.last_col + 1);
        }

        let mut rows = vec![vec![CellValue::Empty; width]; height];
        for (row, col, value) in self.cells {
            rows[row][col] = value;
        }

        for merge in &self.merges {
            let anchor = rows[merge.first_row][merge.first_col].clone();
            if anchor.is_empty() {
                continue;
            }
            for row in merge.first_row..=merge.last_row.min(height - 1) {
                for col in merge.first_col..=merge.last_col.min(width - 1) {
                    if rows[row][col].is_empty() {
                        rows[row][col] = anchor.clone();
                    }
                }
            }
        }

        CellGrid { rows }
    }
}
