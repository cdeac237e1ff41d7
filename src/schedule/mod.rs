//! # Schedule Extraction Module
//!
//! Turns normalized cell grids into lesson records. Sheets are first
//! classified (one timetable sheet per course), then each sheet is
//! scanned for header blocks, and finally every block body is walked
//! with a day cursor while lessons are pulled from each group's column
//! pair. Nothing here aborts on malformed content: whatever cannot be
//! interpreted becomes a warning and extraction continues.

pub(crate) mod classifier;
pub(crate) mod header;
pub(crate) mod lesson;
pub(crate) mod normalize;
pub(crate) mod record;
pub(crate) mod resolve;
pub(crate) mod segment;

pub use record::{
    Diagnostics, EducationBase, LessonRecord, ParseResult, ParseWarning, Weekday,
};

use crate::helpers::reader::SourceBuffer;
use crate::workbook::{SheetGrid, WorkbookLoader};
use chrono::NaiveDate;
use fxhash::FxHashSet;
use header::ScheduleBlock;
use record::LessonRecord as Record;
use resolve::GroupProfile;
use segment::{classify_row, DayCursor, RowMarker, SlotLabel};
use tracing::{debug, info};

/// Loads the workbook through the back-end chain and extracts every
/// course sheet. Back-end failures that were recovered by a fallback
/// are reported as warnings.
pub(crate) fn parse_source(
    source: &SourceBuffer,
    loader: &WorkbookLoader,
    today: NaiveDate,
) -> Result<ParseResult, crate::error::RasptabError> {
    let (sheets, failures) = loader.load(source)?;

    let mut result = ParseResult::default();
    for failure in failures {
        result.diagnostics.warnings.push(ParseWarning::BackendFailed {
            backend: failure.backend.to_owned(),
            message: failure.message,
        });
    }

    let source_hash = source.content_hash();
    for sheet in &sheets {
        result.diagnostics.sheets_seen += 1;
        if !classifier::is_course_sheet(&sheet.name) {
            debug!(sheet = %sheet.name, "not a course sheet, skipped");
            result.diagnostics.sheets_skipped += 1;
            continue;
        }
        extract_sheet(sheet, source, &source_hash, today, &mut result);
    }

    info!(
        origin = source.origin(),
        records = result.records.len(),
        warnings = result.diagnostics.warnings.len(),
        "workbook extracted"
    );
    Ok(result)
}

/// Extracts all blocks of one course sheet into the shared result.
fn extract_sheet(
    sheet: &SheetGrid,
    source: &SourceBuffer,
    source_hash: &str,
    today: NaiveDate,
    result: &mut ParseResult,
) {
    let blocks = header::locate_blocks(&sheet.grid);
    if blocks.is_empty() {
        result.diagnostics.warnings.push(ParseWarning::NoHeaderFound {
            sheet: sheet.name.clone(),
        });
        result.diagnostics.sheets_skipped += 1;
        return;
    }

    let nominal_course = classifier::nominal_course(&sheet.name);
    let mut sheet_groups = Vec::<String>::new();
    let mut unresolved = FxHashSet::<String>::default();

    for block in &blocks {
        if block.groups.is_empty() {
            result.diagnostics.warnings.push(ParseWarning::NoGroupsFound {
                sheet: sheet.name.clone(),
            });
            continue;
        }
        for group in &block.groups {
            if !sheet_groups.contains(&group.name) {
                sheet_groups.push(group.name.clone());
            }
        }
        extract_block(
            sheet,
            block,
            source,
            source_hash,
            today,
            nominal_course,
            &mut unresolved,
            result,
        );
    }

    result
        .diagnostics
        .groups_by_sheet
        .insert(sheet.name.clone(), sheet_groups);
}

/// Walks one block body top to bottom, carrying the day and slot
/// context, and emits a record per group per occupied subject cell.
#[allow(clippy::too_many_arguments)]
fn extract_block(
    sheet: &SheetGrid,
    block: &ScheduleBlock,
    source: &SourceBuffer,
    source_hash: &str,
    today: NaiveDate,
    nominal_course: Option<u8>,
    unresolved: &mut FxHashSet<String>,
    result: &mut ParseResult,
) {
    let profiles: Vec<Option<GroupProfile>> = block
        .groups
        .iter()
        .map(|group| {
            let profile = resolve::profile_group(&group.name, today);
            let resolved = profile.is_some_and(|it| it.course.is_some());
            if !resolved && unresolved.insert(group.name.clone()) {
                result
                    .diagnostics
                    .warnings
                    .push(ParseWarning::UnresolvedCourseOrBase {
                        sheet: sheet.name.clone(),
                        group: group.name.clone(),
                    });
            }
            profile
        })
        .collect();

    let mut cursor = DayCursor::default();

    for row in block.body.clone() {
        let marker = classify_row(&sheet.grid, row);
        cursor.advance(&marker);
        // Only slot rows carry lessons; plain rows are either stacked
        // teacher lines (consumed by lookahead) or noise.
        let slot: &SlotLabel = match &marker {
            RowMarker::Day { date_error, .. } => {
                if let Some(text) = date_error {
                    result.diagnostics.warnings.push(ParseWarning::UnparseableDate {
                        sheet: sheet.name.clone(),
                        row,
                        text: text.clone(),
                    });
                }
                continue;
            }
            RowMarker::Slot(label) => label,
            RowMarker::Plain => continue,
        };

        // Lessons make no sense before the first day marker.
        let Some(day) = cursor.day else {
            continue;
        };

        for (group, profile) in block.groups.iter().zip(&profiles) {
            let Some(cell) = lesson::extract_at(&sheet.grid, &block.body, row, group) else {
                continue;
            };
            result.records.push(Record {
                group_name: group.name.clone(),
                education_base: profile.map(|it| it.base),
                // An out-of-range course is positive evidence of a stale
                // group; only a name the resolver cannot read at all
                // falls back to the sheet's nominal course.
                course: match profile {
                    Some(profile) => profile.course,
                    None => nominal_course,
                },
                day_of_week: day,
                date: cursor.date,
                slot_label: slot.label.clone(),
                slot_number: slot.number,
                time_start: slot.start,
                time_end: slot.end,
                subject: cell.subject,
                teacher: cell.teacher,
                room: cell.room,
                resource_link: cell.resource_link,
                sheet_name: sheet.name.clone(),
                source_file: source.origin().to_owned(),
                source_file_hash: source_hash.to_owned(),
            });
        }
    }
}
