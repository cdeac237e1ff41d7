//! Output model of the extraction engine: normalized lesson records plus
//! the diagnostics accumulated while producing them.

use chrono::{NaiveDate, NaiveTime};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Teaching days of the week. Sunday never appears in a timetable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    const NAMES: [(Weekday, &'static str); 6] = [
        (Weekday::Monday, "понедельник"),
        (Weekday::Tuesday, "вторник"),
        (Weekday::Wednesday, "среда"),
        (Weekday::Thursday, "четверг"),
        (Weekday::Friday, "пятница"),
        (Weekday::Saturday, "суббота"),
    ];

    /// Finds a day name anywhere inside the text, case-insensitively.
    /// Day labels in the wild come glued to dates and stray punctuation,
    /// so containment beats exact matching.
    pub fn from_text(text: &str) -> Option<Weekday> {
        let lowered = text.to_lowercase();
        Self::NAMES
            .iter()
            .find(|(_, name)| lowered.contains(name))
            .map(|(day, _)| *day)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "Понедельник",
            Weekday::Tuesday => "Вторник",
            Weekday::Wednesday => "Среда",
            Weekday::Thursday => "Четверг",
            Weekday::Friday => "Пятница",
            Weekday::Saturday => "Суббота",
        }
    }
}

/// Length of the school program a group was admitted after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationBase {
    /// Admitted after 9 grades.
    NineYears,
    /// Admitted after 11 grades.
    ElevenYears,
}

/// One normalized lesson: a single group, day and slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub group_name: String,
    pub education_base: Option<EducationBase>,
    pub course: Option<u8>,
    pub day_of_week: Weekday,
    pub date: Option<NaiveDate>,
    /// Slot label exactly as it appeared in the sheet.
    pub slot_label: String,
    pub slot_number: Option<u8>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub subject: String,
    pub teacher: Option<String>,
    pub room: Option<String>,
    pub resource_link: Option<String>,
    pub sheet_name: String,
    pub source_file: String,
    pub source_file_hash: String,
}

/// Non-fatal problems observed during extraction. The engine keeps going
/// and reports these alongside whatever it could extract.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum ParseWarning {
    #[error("backend {backend} failed: {message}")]
    BackendFailed { backend: String, message: String },

    #[error("sheet {sheet:?}: no header row with group columns found")]
    NoHeaderFound { sheet: String },

    #[error("sheet {sheet:?}: header found but no group columns mapped")]
    NoGroupsFound { sheet: String },

    #[error("sheet {sheet:?} row {row}: day marker {text:?} has no parseable date")]
    UnparseableDate { sheet: String, row: usize, text: String },

    #[error("sheet {sheet:?}: cannot derive course or base for group {group:?}")]
    UnresolvedCourseOrBase { sheet: String, group: String },
}

/// Extraction summary for one whole workbook.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub sheets_seen: usize,
    pub sheets_skipped: usize,
    pub groups_by_sheet: FxHashMap<String, Vec<String>>,
    pub warnings: Vec<ParseWarning>,
}

/// Everything a workbook yields: the records and how cleanly they came out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub records: Vec<LessonRecord>,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_is_found_inside_noisy_labels() {
        assert_eq!(
            Weekday::from_text("ПОНЕДЕЛЬНИК 01.09.2025"),
            Some(Weekday::Monday)
        );
        assert_eq!(Weekday::from_text("  суббота"), Some(Weekday::Saturday));
        assert_eq!(Weekday::from_text("воскресенье"), None);
        assert_eq!(Weekday::from_text("I пара"), None);
    }

    #[test]
    fn warnings_render_readable_messages() {
        let warning = ParseWarning::UnparseableDate {
            sheet: "1 курс".to_owned(),
            row: 4,
            text: "Среда 31.02.2025".to_owned(),
        };
        assert!(warning.to_string().contains("row 4"));
        assert!(warning.to_string().contains("31.02.2025"));
    }
}
