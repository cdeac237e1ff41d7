//! Derives study metadata from a group name. Names like `БУ1-24` encode
//! the specialty, the admission base and the admission year, which is
//! enough to compute the current course without any external data.

use crate::schedule::record::EducationBase;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Specialty letters, optional base digit, dash, two-digit admission year.
static GROUP_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([А-ЯЁ]{1,3})(\d?)-(\d{2})").unwrap());

/// Metadata recoverable from the group name alone. The course stays
/// unset when the admission year puts it outside the program length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GroupProfile {
    pub base: EducationBase,
    pub course: Option<u8>,
}

/// Parses the group name and computes its profile as of `today`.
/// Returns `None` when the name does not follow the usual shape.
pub(crate) fn profile_group(name: &str, today: NaiveDate) -> Option<GroupProfile> {
    let captures = GROUP_SHAPE.captures(name.trim())?;
    // A digit after the specialty letters marks admission after 9 grades.
    let base = if captures[2].is_empty() {
        EducationBase::ElevenYears
    } else {
        EducationBase::NineYears
    };
    let admission_year: i32 = captures[3].parse().ok()?;
    Some(GroupProfile {
        base,
        course: course_for(admission_year, today),
    })
}

/// Course counted from the admission year. The academic year turns over
/// in September, so autumn months already belong to the next course.
/// A result outside 1..=4 marks a stale or mistyped group and is
/// discarded rather than stored.
fn course_for(admission_year: i32, today: NaiveDate) -> Option<u8> {
    let mut course = today.year() % 100 - admission_year;
    if today.month() >= 9 {
        course += 1;
    }
    (1..=4).contains(&course).then(|| course as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn base_digit_marks_nine_year_admission() {
        let today = date(2025, 10, 1);
        let profile = profile_group("БУ1-24", today).unwrap();
        assert_eq!(profile.base, EducationBase::NineYears);

        let profile = profile_group("ПСО-23", today).unwrap();
        assert_eq!(profile.base, EducationBase::ElevenYears);
    }

    #[test]
    fn course_turns_over_in_september() {
        // Spring of the first study year.
        assert_eq!(
            profile_group("БУ1-24", date(2025, 5, 15)).unwrap().course,
            Some(1)
        );
        // Autumn after the first summer.
        assert_eq!(
            profile_group("БУ1-24", date(2025, 10, 1)).unwrap().course,
            Some(2)
        );
    }

    #[test]
    fn course_outside_the_program_length_is_discarded() {
        // Admitted seven academic years ago: stale group, no course.
        let stale = profile_group("БУ1-19", date(2025, 10, 1)).unwrap();
        assert_eq!(stale.course, None);
        assert_eq!(stale.base, EducationBase::NineYears);
        // Admission year in the future is equally impossible.
        assert_eq!(profile_group("БУ1-27", date(2025, 10, 1)).unwrap().course, None);
    }

    #[test]
    fn unusual_names_yield_no_profile() {
        let today = date(2025, 10, 1);
        assert!(profile_group("группа", today).is_none());
        assert!(profile_group("1-24", today).is_none());
        assert!(profile_group("", today).is_none());
    }

    #[test]
    fn suffixed_names_still_resolve() {
        let today = date(2025, 10, 1);
        assert!(profile_group("ИСП2-24(а)", today).is_some());
    }
}
