//! Pulls one lesson out of a group's column pair: the subject cell, the
//! room next to it, an optional teacher line stacked on the row below
//! and an optional resource link embedded in the subject text.

use crate::schedule::header::GroupColumns;
use crate::schedule::normalize::clean_cell;
use crate::schedule::segment::{classify_row, RowMarker};
use crate::workbook::grid::CellGrid;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

/// Extracted content of one subject/room column pair at one row.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LessonCell {
    pub subject: String,
    pub teacher: Option<String>,
    pub room: Option<String>,
    pub resource_link: Option<String>,
}

/// Finds an embedded link in the subject text. The subject itself is
/// stored as written; the link is only copied out. Trailing punctuation
/// glued to the URL by the sheet author is not part of it.
pub(crate) fn find_resource_link(text: &str) -> Option<String> {
    let found = LINK.find(text)?;
    let raw = found.as_str().trim_end_matches(['.', ',', ';', ':', ')', ']']);
    url::Url::parse(raw).ok().map(|parsed| parsed.to_string())
}

/// Extracts the lesson at `row` for one group. Returns `None` when the
/// subject cell normalizes to nothing.
pub(crate) fn extract_at(
    grid: &CellGrid,
    body: &Range<usize>,
    row: usize,
    group: &GroupColumns,
) -> Option<LessonCell> {
    let subject = clean_cell(grid.value(row, group.subject_col));
    if subject.is_empty() {
        return None;
    }
    let resource_link = find_resource_link(&subject);

    let room = Some(clean_cell(grid.value(row, group.room_col))).filter(|it| !it.is_empty());
    let teacher = stacked_teacher(grid, body, row, group);
    Some(LessonCell {
        subject,
        teacher,
        room,
        resource_link,
    })
}

/// The teacher name, when present, sits on the next row in the same
/// subject column, on a row that is neither a day marker nor a slot
/// row.
fn stacked_teacher(
    grid: &CellGrid,
    body: &Range<usize>,
    row: usize,
    group: &GroupColumns,
) -> Option<String> {
    let next = row + 1;
    if !body.contains(&next) {
        return None;
    }
    if classify_row(grid, next) != RowMarker::Plain {
        return None;
    }
    let teacher = clean_cell(grid.value(next, group.subject_col));
    if teacher.is_empty() {
        return None;
    }
    Some(teacher)
}
