//! # Tracker Facade
//!
//! [`TutorTracker`] owns the in-memory roster and calendar and is the single
//! entry point for every mutation. Each operation runs against a clone of the
//! state; balances are reconciled, both collections are saved, and only then
//! is the clone committed. If any step fails the tracker is left exactly as
//! it was, so a lesson change and its balance change are never seen apart.

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{debug, info, warn};
use shared::{AddLessonRequest, AppSettings, EditScope, RemovalMode, TrackerSnapshot};

use super::domain::balance_service::{BalancePolicyKind, BalanceService};
use super::domain::commands::lessons::{DeleteLessonsResult, LessonBatchResult};
use super::domain::commands::reports::{ReportExport, StudentReport};
use super::domain::commands::students::StudentRemovalOutcome;
use super::domain::errors::{TrackerError, TrackerResult};
use super::domain::lesson_service::LessonService;
use super::domain::models::{Lesson, Student, TrackerState};
use super::domain::report_service::ReportService;
use super::domain::student_service::StudentService;
use super::domain::sync_service::{export_data, import_data};
use super::io::mappers::{LessonMapper, StudentMapper};
use super::storage::traits::TrackerStorage;
use crate::config::TrackerConfig;

pub struct TutorTracker<S: TrackerStorage> {
    storage: S,
    state: TrackerState,
    lesson_service: LessonService,
    student_service: StudentService,
    balance_service: BalanceService,
    report_service: ReportService,
}

/// Convert stored DTOs, dropping entries whose dates or timestamps don't parse
fn map_lenient<D, T>(items: Vec<D>, label: &str, to_domain: fn(D) -> Result<T>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match to_domain(item) {
            Ok(mapped) => Some(mapped),
            Err(e) => {
                warn!("Dropping stored {}: {:#}", label, e);
                None
            }
        })
        .collect()
}

/// Convert imported DTOs; any bad entry rejects the whole import
fn map_strict<D, T>(items: Vec<D>, to_domain: fn(D) -> Result<T>) -> TrackerResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| to_domain(item).map_err(|e| TrackerError::MalformedData(format!("{:#}", e))))
        .collect()
}

impl<S: TrackerStorage> TutorTracker<S> {
    /// Load stored data and bring balances in line with the configured policy
    pub fn open(storage: S, config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        let stored = storage.load()?;
        let students = map_lenient(stored.students, "student", StudentMapper::to_domain);
        let lessons = map_lenient(stored.lessons, "lesson", LessonMapper::to_domain);

        let student_service = StudentService::new();
        let balance_service = BalanceService::new(config.balance_policy);
        let lesson_service = LessonService::new(config, student_service.clone(), balance_service.clone());

        let mut state = TrackerState::new(students, lessons);
        balance_service.reconcile(&mut state);
        for problem in balance_service.validate_tips(&state) {
            warn!("{}", problem);
        }

        info!(
            "Tracker opened with {} students and {} lessons ({} balance policy)",
            state.students.len(),
            state.lessons.len(),
            balance_service.kind()
        );
        Ok(Self {
            storage,
            state,
            lesson_service,
            student_service,
            balance_service,
            report_service: ReportService::new(),
        })
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn students(&self) -> &[Student] {
        &self.state.students
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.state.lessons
    }

    pub fn balance_policy(&self) -> BalancePolicyKind {
        self.balance_service.kind()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self, state: &TrackerState) -> TrackerResult<()> {
        let outcome = self.storage.save(
            &StudentMapper::to_dto_list(&state.students),
            &LessonMapper::to_dto_list(&state.lessons),
        )?;
        if !outcome.students_written || !outcome.lessons_written {
            warn!(
                "Partial save: students written={}, lessons written={}",
                outcome.students_written, outcome.lessons_written
            );
        }
        Ok(())
    }

    /// Storage never swaps a non-empty collection for an empty one, so an
    /// operation that would empty one is refused before anything is written
    fn ensure_not_emptied(&self, working: &TrackerState) -> TrackerResult<()> {
        let collections = [
            ("students", self.state.students.len(), working.students.len()),
            ("lessons", self.state.lessons.len(), working.lessons.len()),
        ];
        for (label, before, after) in collections {
            if before > 0 && after == 0 {
                warn!("Refusing to remove the last of {} stored {}", before, label);
                return Err(TrackerError::EmptyOverwrite(label.to_string()));
            }
        }
        Ok(())
    }

    /// Run `operation` on a working copy and commit it only if it and the
    /// save both succeed
    fn transact<T, F>(&mut self, name: &str, operation: F) -> TrackerResult<T>
    where
        F: FnOnce(&Self, &mut TrackerState) -> TrackerResult<T>,
    {
        let mut working = self.state.clone();
        let result = operation(self, &mut working).map_err(|e| {
            debug!("{} rejected: {}", name, e);
            e
        })?;
        self.balance_service.reconcile(&mut working);
        self.ensure_not_emptied(&working)?;
        self.persist(&working)?;
        self.state = working;
        debug!("{} committed", name);
        Ok(result)
    }

    pub fn add_lesson(&mut self, request: AddLessonRequest, is_weekly: bool) -> TrackerResult<LessonBatchResult> {
        let command = LessonMapper::to_add_command(request)?;
        self.transact("add_lesson", |tracker, state| {
            tracker.lesson_service.add_lesson(state, command, is_weekly)
        })
    }

    pub fn delete_lesson(&mut self, lesson_id: &str, scope: EditScope) -> TrackerResult<DeleteLessonsResult> {
        self.transact("delete_lesson", |tracker, state| {
            tracker.lesson_service.delete_lesson(state, lesson_id, scope)
        })
    }

    pub fn change_lesson_time(
        &mut self,
        lesson_id: &str,
        new_date: NaiveDate,
        new_hour: NaiveTime,
        new_duration: f64,
        scope: EditScope,
    ) -> TrackerResult<LessonBatchResult> {
        self.transact("change_lesson_time", |tracker, state| {
            tracker
                .lesson_service
                .change_lesson_time(state, lesson_id, new_date, new_hour, new_duration, scope)
        })
    }

    pub fn change_lesson_price(&mut self, lesson_id: &str, new_price: f64, scope: EditScope) -> TrackerResult<Vec<Lesson>> {
        self.transact("change_lesson_price", |tracker, state| {
            tracker.lesson_service.change_lesson_price(state, lesson_id, new_price, scope)
        })
    }

    /// Mark a lesson paid or unpaid and return it as committed.
    ///
    /// Under the prepaid policy the returned lesson reflects reconciliation:
    /// unmarking a lesson that remaining credit still covers leaves it paid.
    pub fn set_lesson_paid(&mut self, lesson_id: &str, paid: bool) -> TrackerResult<Lesson> {
        self.transact("set_lesson_paid", |tracker, state| {
            tracker.balance_service.set_lesson_paid(state, lesson_id, paid)
        })?;
        Ok(self.state.lesson(lesson_id)?.clone())
    }

    pub fn set_lesson_tips(&mut self, lesson_id: &str, tips: f64) -> TrackerResult<Lesson> {
        self.transact("set_lesson_tips", |tracker, state| {
            tracker.lesson_service.set_lesson_tips(state, lesson_id, tips)
        })
    }

    pub fn top_up_balance(&mut self, student_id: &str, amount: f64) -> TrackerResult<Student> {
        self.transact("top_up_balance", |tracker, state| {
            tracker.balance_service.apply_top_up(state, student_id, amount)
        })
    }

    /// Archive or delete a student as of the local wall clock
    pub fn remove_student(&mut self, student_id: &str, mode: RemovalMode) -> TrackerResult<StudentRemovalOutcome> {
        self.remove_student_at(student_id, mode, Local::now().naive_local())
    }

    pub fn remove_student_at(
        &mut self,
        student_id: &str,
        mode: RemovalMode,
        now: NaiveDateTime,
    ) -> TrackerResult<StudentRemovalOutcome> {
        self.transact("remove_student", |tracker, state| {
            tracker
                .student_service
                .remove_student(state, student_id, mode, now, &tracker.balance_service)
        })
    }

    pub fn update_student_color(&mut self, student_id: &str, color: &str) -> TrackerResult<Student> {
        self.transact("update_student_color", |tracker, state| {
            tracker.student_service.update_student_color(state, student_id, color)
        })
    }

    pub fn student_report(&self, student_id: &str, count: usize) -> TrackerResult<StudentReport> {
        self.report_service.student_report(&self.state, student_id, count)
    }

    pub fn export_student_report(&self, student_id: &str, count: usize) -> TrackerResult<ReportExport> {
        self.report_service
            .export_report_csv(&self.state, student_id, count, Local::now().date_naive())
    }

    pub fn suggested_price(&self, student_name: &str) -> Option<f64> {
        self.lesson_service.suggested_price(&self.state, student_name)
    }

    /// Current data as a sync snapshot
    pub fn snapshot(&self, settings: &AppSettings) -> TrackerSnapshot {
        let now = Utc::now();
        TrackerSnapshot {
            students: StudentMapper::to_dto_list(&self.state.students),
            lessons: LessonMapper::to_dto_list(&self.state.lessons),
            settings: settings.clone(),
            last_modified: now.to_rfc3339(),
            version: now.timestamp_millis(),
        }
    }

    /// Replace everything with downloaded or imported data
    pub fn replace_data(&mut self, students: Vec<shared::Student>, lessons: Vec<shared::Lesson>) -> TrackerResult<()> {
        let students = map_strict(students, StudentMapper::to_domain)?;
        let lessons = map_strict(lessons, LessonMapper::to_domain)?;
        self.transact("replace_data", |_, state| {
            *state = TrackerState::new(students, lessons);
            info!(
                "Replacing local data with {} students and {} lessons",
                state.students.len(),
                state.lessons.len()
            );
            Ok(())
        })
    }

    pub fn apply_snapshot(&mut self, snapshot: TrackerSnapshot) -> TrackerResult<AppSettings> {
        self.replace_data(snapshot.students, snapshot.lessons)?;
        Ok(snapshot.settings)
    }

    pub fn export_json(&self, settings: &AppSettings) -> TrackerResult<String> {
        export_data(
            &StudentMapper::to_dto_list(&self.state.students),
            &LessonMapper::to_dto_list(&self.state.lessons),
            settings,
            Utc::now(),
        )
    }

    /// Import an export file; returns its settings for the caller to persist
    pub fn import_json(&mut self, json: &str) -> TrackerResult<AppSettings> {
        let data = import_data(json)?;
        self.replace_data(data.students, data.lessons)?;
        Ok(data.settings)
    }
}
