//! Fixture builders shared by the domain tests.

use chrono::{NaiveDate, NaiveTime};

use super::models::{Lesson, Student, TrackerState};

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

pub fn hour(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").expect("valid test hour")
}

/// Unpaid one-off lesson for `student::ann` priced at 20
pub fn lesson(id: &str, day: &str, at: &str, duration: f64) -> Lesson {
    Lesson {
        id: id.to_string(),
        date: date(day),
        hour: hour(at),
        student_id: "student::ann".to_string(),
        price: 20.0,
        duration,
        student_phone_number: None,
        recurring_id: None,
        is_paid: false,
        tips: 0.0,
    }
}

pub fn student(id: &str, name: &str, balance: f64) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        color: Student::color_for_index(0).to_string(),
        balance,
        is_archived: false,
        archived_date: None,
    }
}

/// State with Ann (`student::ann`) on the roster and no lessons
pub fn state_with_ann(balance: f64) -> TrackerState {
    TrackerState::new(vec![student("student::ann", "Ann", balance)], Vec::new())
}

/// Weekly series of `count` lessons for Ann starting at `first_day` 10:00
pub fn series(recurring_id: &str, first_day: &str, count: usize) -> Vec<Lesson> {
    (0..count)
        .map(|i| {
            let mut l = lesson(&format!("{}-{}", recurring_id, i + 1), first_day, "10:00", 1.0);
            l.date = super::models::lesson::occurrence_date(l.date, i);
            l.recurring_id = Some(recurring_id.to_string());
            l
        })
        .collect()
}
