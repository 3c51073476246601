//! In-memory collections every tracker operation works on.

use super::lesson::Lesson;
use super::student::Student;
use crate::backend::domain::errors::{TrackerError, TrackerResult};

/// The full roster and calendar, always materialised in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    pub students: Vec<Student>,
    pub lessons: Vec<Lesson>,
}

impl TrackerState {
    pub fn new(students: Vec<Student>, lessons: Vec<Lesson>) -> Self {
        Self { students, lessons }
    }

    pub fn find_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    pub fn lesson(&self, lesson_id: &str) -> TrackerResult<&Lesson> {
        self.find_lesson(lesson_id)
            .ok_or_else(|| TrackerError::LessonNotFound(lesson_id.to_string()))
    }

    pub fn lesson_mut(&mut self, lesson_id: &str) -> TrackerResult<&mut Lesson> {
        self.lessons
            .iter_mut()
            .find(|l| l.id == lesson_id)
            .ok_or_else(|| TrackerError::LessonNotFound(lesson_id.to_string()))
    }

    pub fn find_student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }

    pub fn student(&self, student_id: &str) -> TrackerResult<&Student> {
        self.find_student(student_id)
            .ok_or_else(|| TrackerError::StudentNotFound(student_id.to_string()))
    }

    pub fn student_mut(&mut self, student_id: &str) -> TrackerResult<&mut Student> {
        self.students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| TrackerError::StudentNotFound(student_id.to_string()))
    }

    /// Add `delta` to a student's balance
    pub fn adjust_balance(&mut self, student_id: &str, delta: f64) -> TrackerResult<&Student> {
        let student = self.student_mut(student_id)?;
        student.balance += delta;
        Ok(student)
    }

    /// Lessons of one student in chronological order
    pub fn lessons_for_student(&self, student_id: &str) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self
            .lessons
            .iter()
            .filter(|l| l.student_id == student_id)
            .collect();
        lessons.sort_by_key(|l| l.start());
        lessons
    }

    /// Sum of prices of a student's lessons currently marked paid
    pub fn paid_total(&self, student_id: &str) -> f64 {
        self.lessons
            .iter()
            .filter(|l| l.student_id == student_id && l.is_paid)
            .map(|l| l.price)
            .sum()
    }
}
