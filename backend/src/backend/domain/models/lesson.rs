//! Domain model for a scheduled lesson.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

/// Number of days between two occurrences of a weekly series
pub const DAYS_BETWEEN_OCCURRENCES: i64 = 7;

/// Longest lesson the calendar can hold, in hours
pub const MAX_DURATION_HOURS: f64 = 24.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: String,
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub student_id: String,
    pub price: f64,
    /// Length in hours
    pub duration: f64,
    pub student_phone_number: Option<String>,
    /// Shared by every occurrence generated from one weekly add
    pub recurring_id: Option<String>,
    pub is_paid: bool,
    /// Only non-zero while `is_paid` is set
    pub tips: f64,
}

impl Lesson {
    /// Generate a unique lesson ID, e.g. `lesson::5f0c...`
    pub fn generate_id() -> String {
        format!("lesson::{}", Uuid::new_v4())
    }

    /// Generate the identifier shared by one weekly series
    pub fn generate_recurring_id() -> String {
        format!("series::{}", Uuid::new_v4())
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.hour)
    }

    /// Saturates at the start when the end would fall off the calendar
    pub fn end(&self) -> NaiveDateTime {
        let start = self.start();
        start
            .checked_add_signed(duration_from_hours(self.duration))
            .unwrap_or(start)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring_id.is_some()
    }

    pub fn in_series(&self, recurring_id: &str) -> bool {
        self.recurring_id.as_deref() == Some(recurring_id)
    }

    /// Mark the lesson unpaid, dropping any tips recorded against it
    pub fn clear_payment(&mut self) {
        self.is_paid = false;
        self.tips = 0.0;
    }
}

pub fn is_valid_duration(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0 && hours <= MAX_DURATION_HOURS
}

/// Convert decimal hours to a time delta at minute granularity, clamped to
/// `0..=MAX_DURATION_HOURS`.
pub fn duration_from_hours(hours: f64) -> Duration {
    let hours = if hours.is_finite() { hours.clamp(0.0, MAX_DURATION_HOURS) } else { 0.0 };
    Duration::minutes((hours * 60.0).round() as i64)
}

/// Date of the `index`-th weekly occurrence after `first`.
pub fn occurrence_date(first: NaiveDate, index: usize) -> NaiveDate {
    first + Duration::days(DAYS_BETWEEN_OCCURRENCES * index as i64)
}
