//! Roster management: implicit creation by name, colour edits, and
//! archiving or deleting students together with their future lessons.

use chrono::{NaiveDateTime, Utc};
use log::{info, warn};
use shared::RemovalMode;

use super::balance_service::BalanceService;
use super::commands::lessons::Refund;
use super::commands::students::StudentRemovalOutcome;
use super::errors::{TrackerError, TrackerResult};
use super::models::student::is_valid_color;
use super::models::{Lesson, Student, TrackerState};

const MAX_NAME_LENGTH: usize = 100;

/// Service for managing students on the roster
#[derive(Debug, Clone, Default)]
pub struct StudentService;

impl StudentService {
    pub fn new() -> Self {
        Self
    }

    /// Active student whose name matches case-insensitively
    pub fn find_by_name<'a>(&self, state: &'a TrackerState, name: &str) -> Option<&'a Student> {
        state
            .students
            .iter()
            .find(|s| !s.is_archived && s.matches_name(name))
    }

    pub fn validate_name(&self, name: &str) -> TrackerResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::InvalidInput("Student name cannot be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(TrackerError::InvalidInput(format!(
                "Student name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }

    /// Return the id of the student with this name, creating one if unseen
    pub fn resolve_or_create_student(&self, state: &mut TrackerState, name: &str) -> TrackerResult<String> {
        self.validate_name(name)?;

        if let Some(existing) = self.find_by_name(state, name) {
            return Ok(existing.id.clone());
        }

        let student = Student::new(name, state.students.len());
        info!("Created student: {} with ID: {}", student.name, student.id);
        let id = student.id.clone();
        state.students.push(student);
        Ok(id)
    }

    pub fn update_student_color(&self, state: &mut TrackerState, student_id: &str, color: &str) -> TrackerResult<Student> {
        if !is_valid_color(color) {
            return Err(TrackerError::InvalidInput(format!("Invalid colour: {}", color)));
        }
        let student = state.student_mut(student_id)?;
        student.color = color.to_uppercase();
        info!("Updated colour for {} to {}", student.name, student.color);
        Ok(student.clone())
    }

    /// Archive or delete a student, purging lessons that start after `now`.
    ///
    /// Lessons at or before `now` stay on the calendar. The total price of
    /// purged paid lessons is refunded to the archived balance, or only
    /// reported when the student is deleted outright.
    pub fn remove_student(
        &self,
        state: &mut TrackerState,
        student_id: &str,
        mode: RemovalMode,
        now: NaiveDateTime,
        balance_service: &BalanceService,
    ) -> TrackerResult<StudentRemovalOutcome> {
        let student = state.student(student_id)?.clone();
        if mode == RemovalMode::Archive && student.is_archived {
            return Err(TrackerError::InvalidInput(format!("{} is already archived", student.name)));
        }

        let (purged_lessons, kept): (Vec<Lesson>, Vec<Lesson>) = std::mem::take(&mut state.lessons)
            .into_iter()
            .partition(|l| l.student_id == student_id && l.start() > now);
        state.lessons = kept;

        let paid_total: f64 = purged_lessons.iter().filter(|l| l.is_paid).map(|l| l.price).sum();

        let outcome = match mode {
            RemovalMode::Archive => {
                if paid_total > 0.0 {
                    balance_service.apply_refunds(
                        state,
                        &[Refund { student_id: student_id.to_string(), amount: paid_total }],
                    )?;
                }
                let archived = state.student_mut(student_id)?;
                archived.is_archived = true;
                archived.archived_date = Some(Utc::now());
                info!(
                    "Archived {} ({} future lessons purged, {:.2} refunded)",
                    archived.name,
                    purged_lessons.len(),
                    paid_total
                );
                StudentRemovalOutcome::Archived {
                    student: archived.clone(),
                    purged_lessons,
                    refund_total: paid_total,
                }
            }
            RemovalMode::Delete => {
                state.students.retain(|s| s.id != student_id);
                if paid_total > 0.0 {
                    warn!(
                        "Deleted {} with {:.2} of paid future lessons; consider a manual refund",
                        student.name, paid_total
                    );
                }
                info!("Deleted {} ({} future lessons purged)", student.name, purged_lessons.len());
                StudentRemovalOutcome::Deleted {
                    student,
                    purged_lessons,
                    unrefunded_total: paid_total,
                }
            }
        };

        Ok(outcome)
    }
}
