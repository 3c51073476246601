//! Domain-level command and result types.
//!
//! These are used by the services inside the domain layer. The `shared` crate
//! holds the persisted/wire shapes; the io mappers translate between the two.

pub mod lessons {
    use chrono::{NaiveDate, NaiveTime};

    use crate::backend::domain::models::Lesson;

    /// Input for adding a lesson (or the first lesson of a weekly series).
    #[derive(Debug, Clone)]
    pub struct AddLessonCommand {
        /// Typed name; matched case-insensitively against the roster
        pub student_name: String,
        pub price: f64,
        pub duration: f64,
        pub date: NaiveDate,
        pub hour: NaiveTime,
        pub student_phone_number: Option<String>,
    }

    /// A weekly occurrence that could not be placed.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SkippedOccurrence {
        pub date: NaiveDate,
        pub hour: NaiveTime,
        pub reason: String,
    }

    /// Money refunded to one student by a single operation.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Refund {
        pub student_id: String,
        pub amount: f64,
    }

    impl Refund {
        /// Sum per-lesson amounts into one refund per student, in first-seen order
        pub fn aggregate<'a, I>(lessons: I) -> Vec<Refund>
        where
            I: IntoIterator<Item = &'a Lesson>,
        {
            let mut refunds: Vec<Refund> = Vec::new();
            for lesson in lessons.into_iter().filter(|l| l.is_paid) {
                match refunds.iter_mut().find(|r| r.student_id == lesson.student_id) {
                    Some(refund) => refund.amount += lesson.price,
                    None => refunds.push(Refund {
                        student_id: lesson.student_id.clone(),
                        amount: lesson.price,
                    }),
                }
            }
            refunds
        }
    }

    /// Result of an add or reschedule, which may place only part of a series.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct LessonBatchResult {
        /// Lessons created or moved, in series order
        pub created: Vec<Lesson>,
        pub skipped: Vec<SkippedOccurrence>,
        /// Refunds for paid occurrences that were replaced
        pub refunded: Vec<Refund>,
    }

    /// Result of deleting one lesson or the tail of a series.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct DeleteLessonsResult {
        pub removed: Vec<Lesson>,
        pub refunded: Vec<Refund>,
    }
}

pub mod students {
    use crate::backend::domain::models::{Lesson, Student};

    /// Tagged outcome of archiving or deleting a student.
    #[derive(Debug, Clone, PartialEq)]
    pub enum StudentRemovalOutcome {
        /// Student kept with the archive flag; refunds went to its balance
        Archived {
            student: Student,
            purged_lessons: Vec<Lesson>,
            refund_total: f64,
        },
        /// Student removed; paid future lessons are reported, not refunded
        Deleted {
            student: Student,
            purged_lessons: Vec<Lesson>,
            unrefunded_total: f64,
        },
    }

    impl StudentRemovalOutcome {
        pub fn student(&self) -> &Student {
            match self {
                Self::Archived { student, .. } | Self::Deleted { student, .. } => student,
            }
        }

        pub fn purged_lessons(&self) -> &[Lesson] {
            match self {
                Self::Archived { purged_lessons, .. } | Self::Deleted { purged_lessons, .. } => {
                    purged_lessons
                }
            }
        }

        /// Total price of paid lessons that were purged
        pub fn refund_total(&self) -> f64 {
            match self {
                Self::Archived { refund_total, .. } => *refund_total,
                Self::Deleted { unrefunded_total, .. } => *unrefunded_total,
            }
        }
    }
}

pub mod reports {
    use chrono::{NaiveDate, NaiveTime};

    #[derive(Debug, Clone, PartialEq)]
    pub struct StudentReportEntry {
        pub date: NaiveDate,
        pub hour: NaiveTime,
        pub price: f64,
        pub duration: f64,
    }

    /// Most recent lessons of one student, newest first.
    #[derive(Debug, Clone, PartialEq)]
    pub struct StudentReport {
        pub student_name: String,
        pub requested_count: usize,
        pub entries: Vec<StudentReportEntry>,
    }

    impl StudentReport {
        pub fn total_price(&self) -> f64 {
            self.entries.iter().map(|e| e.price).sum()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct ReportExport {
        pub csv_content: String,
        pub filename: String,
        pub lesson_count: usize,
        pub student_name: String,
    }
}
