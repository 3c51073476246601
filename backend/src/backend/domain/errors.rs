//! Errors surfaced by tracker operations.

use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Time slot {date} {} conflicts with lesson {conflicting_lesson_id}", hour.format("%H:%M"))]
    Conflict {
        date: NaiveDate,
        hour: NaiveTime,
        conflicting_lesson_id: String,
    },
    #[error("Insufficient balance for student {student_id}: available {available:.2}, required {required:.2}")]
    InsufficientBalance {
        student_id: String,
        available: f64,
        required: f64,
    },
    #[error("Lesson not found: {0}")]
    LessonNotFound(String),
    #[error("Student not found: {0}")]
    StudentNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Malformed data: {0}")]
    MalformedData(String),
    #[error("Refusing to replace stored {0} with an empty list")]
    EmptyOverwrite(String),
    #[error("Remote sync failed: {0}")]
    RemoteSync(String),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Whether the failure came from a stale reference rather than bad input
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::LessonNotFound(_) | TrackerError::StudentNotFound(_))
    }
}
