//! Cell text normalization. Timetable sheets are exported from various
//! office tools and carry stray whitespace, non-breaking spaces and the
//! textual debris of earlier conversions ("nan", "None"). Everything the
//! engine compares or stores goes through here first.

use crate::workbook::grid::CellValue;

/// Textual values that mean "there is nothing here".
const EMPTY_SENTINELS: [&str; 4] = ["nan", "none", "nat", "null"];

/// Trims, collapses internal whitespace runs to single spaces and maps
/// empty-marker strings to the empty string.
pub(crate) fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !cleaned.is_empty() {
            cleaned.push(' ');
        }
        cleaned.push_str(word);
    }
    let lowered = cleaned.to_lowercase();
    if EMPTY_SENTINELS.contains(&lowered.as_str()) {
        return String::new();
    }
    cleaned
}

/// Renders a typed cell as normalized text. Integral numbers print
/// without a trailing ".0" so room numbers and years read naturally.
pub(crate) fn clean_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::Text(text) => clean_text(text),
        CellValue::Number(number) if number.fract() == 0.0 => {
            format!("{}", *number as i64)
        }
        CellValue::Number(number) => format!("{number}"),
        CellValue::DateTime(datetime) => datetime.format("%d.%m.%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn whitespace_collapses_and_sentinels_vanish() {
        assert_eq!(clean_text("  Математика \u{a0} (лекция)  "), "Математика (лекция)");
        assert_eq!(clean_text("nan"), "");
        assert_eq!(clean_text("None"), "");
        assert_eq!(clean_text("NaT"), "");
        assert_eq!(clean_text("   "), "");
        // Sentinels inside longer text survive.
        assert_eq!(clean_text("nan\ntechnology"), "nan technology");
    }

    #[test]
    fn numbers_render_without_float_noise() {
        assert_eq!(clean_cell(&CellValue::Number(301.0)), "301");
        assert_eq!(clean_cell(&CellValue::Number(1.5)), "1.5");
    }

    #[test]
    fn dates_render_in_day_first_form() {
        let datetime = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(clean_cell(&CellValue::DateTime(datetime)), "01.09.2025");
    }
}
