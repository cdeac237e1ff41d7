//! Decides which sheets of a workbook are timetable sheets. Colleges
//! keep one sheet per course, named like "1 курс", next to auxiliary
//! sheets (bell schedules, staff lists) that must be skipped.

use regex::Regex;
use std::sync::LazyLock;

static COURSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d)\s*курс").unwrap());

/// A sheet participates in extraction when its name mentions a course.
pub(crate) fn is_course_sheet(sheet_name: &str) -> bool {
    sheet_name.to_lowercase().contains("курс")
}

/// Nominal course from the sheet name, used as a fallback when the
/// group name itself cannot be resolved.
pub(crate) fn nominal_course(sheet_name: &str) -> Option<u8> {
    COURSE_NUMBER
        .captures(&sheet_name.to_lowercase())
        .and_then(|captures| captures[1].parse().ok())
}
