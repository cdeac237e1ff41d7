//! Classifies body rows into day markers, lesson slots and plain rows,
//! and tracks the day context while walking down a block.

use crate::schedule::normalize::clean_cell;
use crate::schedule::record::Weekday;
use crate::workbook::grid::CellGrid;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

/// Markers live in the leftmost columns; lesson columns start later.
const MARKER_COLUMNS: usize = 6;

static TIME_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*[-–—]\s*(\d{1,2}):(\d{2})").unwrap());

// Longest alternatives first, otherwise "I" wins inside "III".
static ROMAN_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(VII|VI|IV|V|III|II|I)\s*пара").unwrap());

static DAY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").unwrap());

/// A lesson slot as labeled in the sheet.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SlotLabel {
    pub label: String,
    pub number: Option<u8>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

/// What a body row announces in its marker columns.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RowMarker {
    Day {
        day: Weekday,
        date: Option<NaiveDate>,
        /// Marker text when a date was present but did not parse.
        date_error: Option<String>,
    },
    Slot(SlotLabel),
    Plain,
}

/// Day context carried down a block. A day row switches the day; slot
/// and plain rows inherit it.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DayCursor {
    pub day: Option<Weekday>,
    pub date: Option<NaiveDate>,
}

impl DayCursor {
    /// A date that fails to parse keeps the previous one rather than
    /// erasing it; a later valid day row corrects the drift.
    pub fn advance(&mut self, marker: &RowMarker) {
        if let RowMarker::Day { day, date, .. } = marker {
            self.day = Some(*day);
            if date.is_some() {
                self.date = *date;
            }
        }
    }
}

fn marker_cells(grid: &CellGrid, row: usize) -> Vec<String> {
    (0..MARKER_COLUMNS.min(grid.width()))
        .map(|col| clean_cell(grid.value(row, col)))
        .filter(|cell| !cell.is_empty())
        .collect()
}

fn parse_date(text: &str) -> Option<Result<NaiveDate, ()>> {
    let captures = DAY_DATE.captures(text)?;
    let day: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let year: i32 = captures[3].parse().ok()?;
    Some(NaiveDate::from_ymd_opt(year, month, day).ok_or(()))
}

fn roman_to_number(roman: &str) -> Option<u8> {
    match roman {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        "IV" => Some(4),
        "V" => Some(5),
        "VI" => Some(6),
        "VII" => Some(7),
        _ => None,
    }
}

fn parse_slot(text: &str) -> Option<SlotLabel> {
    if !ROMAN_SLOT.is_match(text) && !TIME_RANGE.is_match(text) {
        return None;
    }
    let number = ROMAN_SLOT
        .captures(text)
        .and_then(|captures| roman_to_number(&captures[1]));
    let times = TIME_RANGE.captures(text).and_then(|captures| {
        let start = NaiveTime::from_hms_opt(captures[1].parse().ok()?, captures[2].parse().ok()?, 0)?;
        let end = NaiveTime::from_hms_opt(captures[3].parse().ok()?, captures[4].parse().ok()?, 0)?;
        // A reversed range is a typo; the label is still worth keeping.
        (start < end).then_some((start, end))
    });
    Some(SlotLabel {
        label: text.to_owned(),
        number,
        start: times.map(|(start, _)| start),
        end: times.map(|(_, end)| end),
    })
}

/// Reads the marker columns of a row and decides what the row announces.
/// A day or slot cell may share its row with lesson cells, so each marker
/// cell is examined on its own and the winning cell provides the label.
pub(crate) fn classify_row(grid: &CellGrid, row: usize) -> RowMarker {
    let cells = marker_cells(grid, row);
    for (index, cell) in cells.iter().enumerate() {
        let Some(day) = Weekday::from_text(cell) else {
            continue;
        };
        // The date usually sits in the same cell as the day name, but
        // sometimes lands in a neighboring marker cell. A valid date in
        // any marker cell beats a malformed one in the day cell.
        let mut date = parse_date(cell);
        if !matches!(date, Some(Ok(_))) {
            for (other_index, other) in cells.iter().enumerate() {
                if other_index == index {
                    continue;
                }
                match parse_date(other) {
                    Some(Ok(found)) => {
                        date = Some(Ok(found));
                        break;
                    }
                    Some(Err(())) if date.is_none() => date = Some(Err(())),
                    _ => (),
                }
            }
        }
        return match date {
            Some(Ok(date)) => RowMarker::Day {
                day,
                date: Some(date),
                date_error: None,
            },
            Some(Err(())) => RowMarker::Day {
                day,
                date: None,
                date_error: Some(cells.join(" ")),
            },
            None => RowMarker::Day {
                day,
                date: None,
                date_error: None,
            },
        };
    }
    for cell in &cells {
        if let Some(slot) = parse_slot(cell) {
            return RowMarker::Slot(slot);
        }
    }
    RowMarker::Plain
}
