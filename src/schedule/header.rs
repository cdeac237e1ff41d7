//! Finds the header rows that carry group names and maps each group to
//! its column pair. A sheet may contain several stacked tables, each
//! with its own header, so the locator returns every block it finds.

use crate::schedule::normalize::clean_cell;
use crate::workbook::grid::CellGrid;
use fxhash::FxHashSet;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Group names as they appear in headers, with an optional subgroup
/// suffix in parentheses.
pub(crate) static GROUP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[А-ЯЁ]{1,3}\d?-\d{2}(?:\([^)]+\))?").unwrap());

/// Column pair of one group: subjects in one column, rooms in the next.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GroupColumns {
    pub name: String,
    pub subject_col: usize,
    pub room_col: usize,
}

/// One timetable block: its header row, the body rows below it and the
/// groups mapped from the header.
#[derive(Clone, Debug)]
pub(crate) struct ScheduleBlock {
    pub header_row: usize,
    pub body: Range<usize>,
    pub groups: Vec<GroupColumns>,
}

/// A row naming this many distinct groups is a header on its own.
/// Fewer matches are usually a lesson cell that happens to mention
/// another group, unless a room or group marker backs the row up.
const MIN_HEADER_GROUPS: usize = 3;

fn row_text(grid: &CellGrid, row: usize) -> String {
    let Some(cells) = grid.row(row) else {
        return String::new();
    };
    let mut text = String::new();
    for cell in cells {
        let cleaned = clean_cell(cell);
        if !cleaned.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&cleaned);
        }
    }
    text
}

fn is_header_row(grid: &CellGrid, row: usize) -> bool {
    let text = row_text(grid, row);
    let distinct: FxHashSet<&str> = GROUP_TOKEN
        .find_iter(&text)
        .map(|found| found.as_str())
        .collect();
    if distinct.len() >= MIN_HEADER_GROUPS {
        return true;
    }
    let lowered = text.to_lowercase();
    distinct.len() >= 2 && (lowered.contains("ауд") || lowered.contains("группа"))
}

/// Maps header cells to group column pairs. A cell may list several
/// groups separated by commas; they legitimately share the same pair.
/// A group named twice keeps its first occurrence.
fn map_groups(grid: &CellGrid, row: usize) -> Vec<GroupColumns> {
    let mut groups = Vec::<GroupColumns>::new();
    let mut seen = FxHashSet::<String>::default();
    for col in 0..grid.width() {
        let text = clean_cell(grid.value(row, col));
        if text.is_empty() {
            continue;
        }
        for found in GROUP_TOKEN.find_iter(&text) {
            let name = found.as_str().to_owned();
            if seen.insert(name.clone()) {
                groups.push(GroupColumns {
                    name,
                    subject_col: col,
                    room_col: col + 1,
                });
            }
        }
    }
    groups
}

/// Scans the sheet top to bottom and returns every timetable block.
/// The body of a block runs to the next header row or the sheet end.
pub(crate) fn locate_blocks(grid: &CellGrid) -> Vec<ScheduleBlock> {
    let header_rows: Vec<usize> = (0..grid.height())
        .filter(|&row| is_header_row(grid, row))
        .collect();

    let mut blocks = Vec::with_capacity(header_rows.len());
    for (index, &header_row) in header_rows.iter().enumerate() {
        let body_end = header_rows
            .get(index + 1)
            .copied()
            .unwrap_or_else(|| grid.height());
        let groups = map_groups(grid, header_row);
        blocks.push(ScheduleBlock {
            header_row,
            body: header_row + 1..body_end,
            groups,
        });
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::grid::{CellValue, GridBuilder};

    fn grid_from(rows: &[&[&str]]) -> CellGrid {
        let mut builder = GridBuilder::new();
        for (row_index, row) in rows.iter().enumerate() {
            for (col_index, text) in row.iter().enumerate() {
                if !text.is_empty() {
                    builder.push(row_index, col_index, CellValue::Text((*text).to_owned()));
                }
            }
        }
        builder.build()
    }

    #[test]
    fn header_needs_enough_groups_and_a_marker() {
        let grid = grid_from(&[
            &["", "БУ1-24", "ауд.", "ПСО-24", "ауд.", "ИСП2-24", "ауд."],
            &["", "БУ1-24", "", "ПСО-24", ""],
            &["понедельник", "Математика (БУ1-24 и ПСО-24)", "301"],
        ]);
        assert!(is_header_row(&grid, 0));
        // Groups without the "ауд"/"группа" marker.
        assert!(!is_header_row(&grid, 1));
        // Two group mentions inside a lesson cell are not a header.
        assert!(!is_header_row(&grid, 2));
    }

    #[test]
    fn two_groups_with_a_room_marker_still_form_a_header() {
        let grid = grid_from(&[&["", "БУ1-24", "ауд.", "Ф1-24", "ауд."]]);
        assert!(is_header_row(&grid, 0));
    }

    #[test]
    fn groups_map_to_adjacent_column_pairs() {
        let grid = grid_from(&[&[
            "", "БУ1-24", "ауд.", "ПСО-24", "ауд.", "ИСП2-24", "ауд.",
        ]]);
        let groups = map_groups(&grid, 0);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "БУ1-24");
        assert_eq!((groups[0].subject_col, groups[0].room_col), (1, 2));
        assert_eq!((groups[2].subject_col, groups[2].room_col), (5, 6));
    }

    #[test]
    fn comma_separated_groups_share_one_pair() {
        let grid = grid_from(&[&["группа", "БУ1-24, БУ2-24", "ауд.", "ПСО-24", "ауд.", "ОП-23", "ауд."]]);
        let groups = map_groups(&grid, 0);
        assert_eq!(groups[0].name, "БУ1-24");
        assert_eq!(groups[1].name, "БУ2-24");
        assert_eq!(
            (groups[0].subject_col, groups[0].room_col),
            (groups[1].subject_col, groups[1].room_col)
        );
    }

    #[test]
    fn duplicate_group_keeps_the_first_column() {
        let grid = grid_from(&[&["", "БУ1-24", "ауд.", "БУ1-24", "ауд.", "ПСО-24", "ауд.", "ОП-23", "ауд."]]);
        let groups = map_groups(&grid, 0);
        let positions: Vec<_> = groups.iter().filter(|g| g.name == "БУ1-24").collect();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].subject_col, 1);
    }

    #[test]
    fn stacked_tables_yield_separate_blocks() {
        let grid = grid_from(&[
            &["", "БУ1-24", "ауд.", "ПСО-24", "ауд.", "ИСП2-24", "ауд."],
            &["понедельник", "Математика", "301"],
            &["", "История", "302"],
            &["", "АФК-25", "ауд.", "СА-25", "ауд.", "ОП-25", "ауд."],
            &["вторник", "Физика", "201"],
        ]);
        let blocks = locate_blocks(&grid);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].header_row, 0);
        assert_eq!(blocks[0].body, 1..3);
        assert_eq!(blocks[1].header_row, 3);
        assert_eq!(blocks[1].body, 4..5);
        assert_eq!(blocks[1].groups[0].name, "АФК-25");
    }
}
