//! # rasptab
//!
//! Resilient extraction of lesson records from irregularly formatted
//! timetable workbooks. Colleges publish their schedules as spreadsheet
//! files shaped by hand: merged header cells, stacked tables, day names
//! glued to dates, teachers on their own rows. This crate reads such a
//! workbook through a chain of spreadsheet back ends, locates the group
//! columns and produces one normalized [`LessonRecord`] per group, day
//! and slot, together with [`Diagnostics`] describing everything that
//! could not be interpreted.
//!
//! ```no_run
//! let result = rasptab::parse_file("raspisanie.xlsx")?;
//! for record in &result.records {
//!     println!("{} {:?} {}", record.group_name, record.day_of_week, record.subject);
//! }
//! # Ok::<(), rasptab::RasptabError>(())
//! ```

pub mod error;
mod helpers;
pub mod schedule;
pub mod workbook;

pub use error::RasptabError;
pub use schedule::{
    Diagnostics, EducationBase, LessonRecord, ParseResult, ParseWarning, Weekday,
};
pub use workbook::{LoadError, SheetGrid, WorkbookBackend, WorkbookLoader};

use chrono::{Local, NaiveDate};
use helpers::reader::SourceBuffer;
use std::path::Path;

/// Parses a workbook file from disk, resolving courses as of today.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParseResult, RasptabError> {
    let source = SourceBuffer::from_path(path.as_ref())?;
    schedule::parse_source(&source, &WorkbookLoader::default(), Local::now().date_naive())
}

/// Parses workbook bytes already in memory. The `origin_label` names
/// the source in records and diagnostics (a filename or URL).
pub fn parse_bytes(bytes: Vec<u8>, origin_label: &str) -> Result<ParseResult, RasptabError> {
    parse_bytes_at(bytes, origin_label, Local::now().date_naive())
}

/// Like [`parse_bytes`], with an explicit reference date for course
/// resolution. Useful for reproducible runs and tests.
pub fn parse_bytes_at(
    bytes: Vec<u8>,
    origin_label: &str,
    today: NaiveDate,
) -> Result<ParseResult, RasptabError> {
    let source = SourceBuffer::from_bytes(bytes, origin_label);
    schedule::parse_source(&source, &WorkbookLoader::default(), today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_file_reads_a_workbook_from_disk() {
        let bytes = workbook::fixture::workbook_bytes(
            "1 курс",
            &[
                &["", "БУ1-24", "ауд.", "ПСО-24", "ауд.", "ИСП2-24", "ауд."],
                &["Понедельник 01.09.2025"],
                &["I пара 8:00-9:20", "Математика", "301"],
            ],
        );
        let mut file = tempfile::NamedTempFile::with_suffix(".xlsx").unwrap();
        file.write_all(&bytes).unwrap();

        let result = parse_file(file.path()).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].subject, "Математика");
        assert_eq!(result.records[0].source_file, file.path().display().to_string());
    }

    #[test]
    fn parse_bytes_at_pins_the_reference_date() {
        let bytes = workbook::fixture::workbook_bytes(
            "1 курс",
            &[
                &["", "БУ1-24", "ауд.", "ПСО-24", "ауд.", "ИСП2-24", "ауд."],
                &["Понедельник 01.09.2025"],
                &["I пара 8:00-9:20", "Математика", "301"],
            ],
        );
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let result = parse_bytes_at(bytes, "inline.xlsx", today).unwrap();
        // Spring before the first summer: still the first course.
        assert_eq!(result.records[0].course, Some(1));
        assert_eq!(result.records[0].source_file, "inline.xlsx");
    }

    #[test]
    fn unreadable_bytes_surface_a_load_error() {
        let error = parse_bytes(b"garbage".to_vec(), "bad.bin").unwrap_err();
        assert!(matches!(error, RasptabError::LoadError(_)));
    }
}
