//! Time-slot conflict detection.
//!
//! Lessons occupy the half-open range `[start, start + duration)`, so a lesson
//! ending at 11:00 does not collide with one starting at 11:00.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::models::lesson::{duration_from_hours, Lesson};

pub fn lesson_time_range(date: NaiveDate, hour: NaiveTime, duration: f64) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(hour);
    let end = start.checked_add_signed(duration_from_hours(duration)).unwrap_or(start);
    (start, end)
}

/// First lesson in `others` (other than the candidate itself) whose range
/// overlaps the candidate slot.
pub fn find_conflict<'a, I>(
    candidate_id: &str,
    date: NaiveDate,
    hour: NaiveTime,
    duration: f64,
    others: I,
) -> Option<&'a Lesson>
where
    I: IntoIterator<Item = &'a Lesson>,
{
    let (start, end) = lesson_time_range(date, hour, duration);
    others
        .into_iter()
        .filter(|other| other.id != candidate_id)
        .find(|other| start < other.end() && end > other.start())
}

pub fn has_conflict<'a, I>(
    candidate_id: &str,
    date: NaiveDate,
    hour: NaiveTime,
    duration: f64,
    others: I,
) -> bool
where
    I: IntoIterator<Item = &'a Lesson>,
{
    find_conflict(candidate_id, date, hour, duration, others).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::test_utils::{date, hour, lesson};

    #[test]
    fn test_overlapping_slot_conflicts() {
        let existing = vec![lesson("a", "2024-01-01", "10:00", 1.0)];
        assert!(has_conflict("new", date("2024-01-01"), hour("10:30"), 1.0, &existing));
        assert!(has_conflict("new", date("2024-01-01"), hour("09:30"), 1.0, &existing));
        assert!(has_conflict("new", date("2024-01-01"), hour("10:15"), 0.5, &existing));
    }

    #[test]
    fn test_touching_slots_do_not_conflict() {
        let existing = vec![lesson("a", "2024-01-01", "10:00", 1.0)];
        assert!(!has_conflict("new", date("2024-01-01"), hour("11:00"), 1.0, &existing));
        assert!(!has_conflict("new", date("2024-01-01"), hour("09:00"), 1.0, &existing));
    }

    #[test]
    fn test_lesson_never_conflicts_with_itself() {
        let existing = vec![lesson("a", "2024-01-01", "10:00", 1.0)];
        assert!(!has_conflict("a", date("2024-01-01"), hour("10:30"), 1.0, &existing));
    }

    #[test]
    fn test_different_dates_do_not_conflict() {
        let existing = vec![lesson("a", "2024-01-01", "10:00", 2.0)];
        assert!(!has_conflict("new", date("2024-01-02"), hour("10:00"), 2.0, &existing));
    }

    #[test]
    fn test_find_conflict_reports_blocking_lesson() {
        let existing = vec![
            lesson("a", "2024-01-01", "08:00", 1.0),
            lesson("b", "2024-01-01", "12:00", 1.5),
        ];
        let blocking = find_conflict("new", date("2024-01-01"), hour("13:00"), 1.0, &existing);
        assert_eq!(blocking.map(|l| l.id.as_str()), Some("b"));
    }

    #[test]
    fn test_late_lesson_running_past_midnight_conflicts_next_day() {
        let existing = vec![lesson("a", "2024-01-01", "23:30", 1.0)];
        assert!(has_conflict("new", date("2024-01-02"), hour("00:00"), 0.5, &existing));
    }
}
