//! Lesson scheduling: single and weekly adds, rescheduling, price changes and
//! deletes with `single` / `future` scope over recurring series.
//!
//! A weekly add places up to `recurring_weeks_total` occurrences seven days
//! apart. Only a conflict on the first occurrence rejects the add; later
//! conflicting weeks are skipped and reported in the batch result.
//!
//! `future` scope pivots at the selected occurrence's start: lessons of the
//! series strictly before it are never touched.

use chrono::{NaiveDate, NaiveTime};
use log::{info, warn};
use shared::EditScope;

use super::balance_service::{BalanceService, BALANCE_EPSILON};
use super::commands::lessons::{
    AddLessonCommand, DeleteLessonsResult, LessonBatchResult, Refund, SkippedOccurrence,
};
use super::conflict::find_conflict;
use super::errors::{TrackerError, TrackerResult};
use super::models::lesson::occurrence_date;
use super::models::{Lesson, TrackerState};
use super::student_service::StudentService;
use crate::config::TrackerConfig;

#[derive(Debug, Clone)]
pub struct LessonService {
    recurring_weeks_total: usize,
    allowed_durations: Vec<f64>,
    student_service: StudentService,
    balance_service: BalanceService,
}

impl LessonService {
    pub fn new(config: &TrackerConfig, student_service: StudentService, balance_service: BalanceService) -> Self {
        Self {
            recurring_weeks_total: config.recurring_weeks_total.max(1),
            allowed_durations: config.allowed_durations.clone(),
            student_service,
            balance_service,
        }
    }

    pub fn recurring_weeks_total(&self) -> usize {
        self.recurring_weeks_total
    }

    fn validate_price(&self, price: f64) -> TrackerResult<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(TrackerError::InvalidInput(format!("Price must be positive, got {}", price)));
        }
        Ok(())
    }

    fn validate_duration(&self, duration: f64) -> TrackerResult<()> {
        if self
            .allowed_durations
            .iter()
            .any(|allowed| (allowed - duration).abs() < BALANCE_EPSILON)
        {
            Ok(())
        } else {
            Err(TrackerError::InvalidInput(format!(
                "Duration {}h is not one of {:?}",
                duration, self.allowed_durations
            )))
        }
    }

    /// Add one lesson, or a weekly series when `is_weekly` is set
    pub fn add_lesson(
        &self,
        state: &mut TrackerState,
        command: AddLessonCommand,
        is_weekly: bool,
    ) -> TrackerResult<LessonBatchResult> {
        self.validate_price(command.price)?;
        self.validate_duration(command.duration)?;
        self.student_service.validate_name(&command.student_name)?;

        let first_id = Lesson::generate_id();
        if let Some(blocking) = find_conflict(&first_id, command.date, command.hour, command.duration, &state.lessons) {
            warn!(
                "Cannot add lesson on {} at {}: conflicts with {}",
                command.date, command.hour, blocking.id
            );
            return Err(TrackerError::Conflict {
                date: command.date,
                hour: command.hour,
                conflicting_lesson_id: blocking.id.clone(),
            });
        }

        let student_id = self
            .student_service
            .resolve_or_create_student(state, &command.student_name)?;

        let first = Lesson {
            id: first_id,
            date: command.date,
            hour: command.hour,
            student_id,
            price: command.price,
            duration: command.duration,
            student_phone_number: command
                .student_phone_number
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            recurring_id: is_weekly.then(Lesson::generate_recurring_id),
            is_paid: false,
            tips: 0.0,
        };

        let mut result = LessonBatchResult {
            created: vec![first.clone()],
            ..Default::default()
        };

        if is_weekly {
            for week in 1..self.recurring_weeks_total {
                let date = occurrence_date(first.date, week);
                let candidate_id = Lesson::generate_id();
                let blocking = find_conflict(
                    &candidate_id,
                    date,
                    first.hour,
                    first.duration,
                    state.lessons.iter().chain(result.created.iter()),
                )
                .map(|l| l.id.clone());

                if let Some(blocking_id) = blocking {
                    info!("Skipping recurring lesson on {} at {}: conflicts with {}", date, first.hour, blocking_id);
                    result.skipped.push(SkippedOccurrence {
                        date,
                        hour: first.hour,
                        reason: format!("conflicts with lesson {}", blocking_id),
                    });
                    continue;
                }

                result.created.push(Lesson {
                    id: candidate_id,
                    date,
                    ..first.clone()
                });
            }
        }

        state.lessons.extend(result.created.iter().cloned());
        info!(
            "Added {} lesson(s) for student {} ({} skipped)",
            result.created.len(),
            first.student_id,
            result.skipped.len()
        );
        Ok(result)
    }

    /// Last price charged to the student with this name, for prefilling forms
    pub fn suggested_price(&self, state: &TrackerState, student_name: &str) -> Option<f64> {
        let student = self.student_service.find_by_name(state, student_name)?;
        state
            .lessons_for_student(&student.id)
            .last()
            .map(|l| l.price)
    }

    /// Move a lesson, or it and the rest of its series, to a new slot
    pub fn change_lesson_time(
        &self,
        state: &mut TrackerState,
        lesson_id: &str,
        new_date: NaiveDate,
        new_hour: NaiveTime,
        new_duration: f64,
        scope: EditScope,
    ) -> TrackerResult<LessonBatchResult> {
        self.validate_duration(new_duration)?;
        let original = state.lesson(lesson_id)?.clone();
        let pivot = original.start();
        let series_id = match (scope, &original.recurring_id) {
            (EditScope::Future, Some(id)) => Some(id.clone()),
            _ => None,
        };

        // Later occurrences of the series are about to be replaced, so they
        // cannot block the move; earlier ones still can.
        let blocking = {
            let others = state.lessons.iter().filter(|l| match &series_id {
                Some(sid) => !(l.in_series(sid) && l.start() >= pivot),
                None => true,
            });
            find_conflict(&original.id, new_date, new_hour, new_duration, others).map(|l| l.id.clone())
        };
        if let Some(conflicting_lesson_id) = blocking {
            warn!(
                "Cannot move lesson {} to {} {}: conflicts with {}",
                lesson_id, new_date, new_hour, conflicting_lesson_id
            );
            return Err(TrackerError::Conflict {
                date: new_date,
                hour: new_hour,
                conflicting_lesson_id,
            });
        }

        match series_id {
            None => {
                let lesson = state.lesson_mut(lesson_id)?;
                lesson.date = new_date;
                lesson.hour = new_hour;
                lesson.duration = new_duration;
                info!("Moved lesson {} to {} {} ({}h)", lesson_id, new_date, new_hour, new_duration);
                Ok(LessonBatchResult {
                    created: vec![lesson.clone()],
                    ..Default::default()
                })
            }
            Some(sid) => self.reschedule_series_tail(state, original, &sid, new_date, new_hour, new_duration),
        }
    }

    fn reschedule_series_tail(
        &self,
        state: &mut TrackerState,
        original: Lesson,
        recurring_id: &str,
        new_date: NaiveDate,
        new_hour: NaiveTime,
        new_duration: f64,
    ) -> TrackerResult<LessonBatchResult> {
        let pivot = original.start();
        let (replaced, mut kept): (Vec<Lesson>, Vec<Lesson>) = std::mem::take(&mut state.lessons)
            .into_iter()
            .partition(|l| l.in_series(recurring_id) && l.start() >= pivot);
        let following_count = replaced.iter().filter(|l| l.start() > pivot).count();

        let moved = Lesson {
            date: new_date,
            hour: new_hour,
            duration: new_duration,
            ..original.clone()
        };
        kept.push(moved.clone());

        let mut result = LessonBatchResult {
            created: vec![moved],
            ..Default::default()
        };

        for i in 0..following_count {
            let date = occurrence_date(new_date, i + 1);
            let candidate_id = Lesson::generate_id();
            let blocking = find_conflict(&candidate_id, date, new_hour, new_duration, &kept).map(|l| l.id.clone());
            if let Some(blocking_id) = blocking {
                info!("Skipping re-creation of recurring lesson on {} at {}: conflicts with {}", date, new_hour, blocking_id);
                result.skipped.push(SkippedOccurrence {
                    date,
                    hour: new_hour,
                    reason: format!("conflicts with lesson {}", blocking_id),
                });
                continue;
            }

            let occurrence = Lesson {
                id: candidate_id,
                date,
                hour: new_hour,
                student_id: original.student_id.clone(),
                price: original.price,
                duration: new_duration,
                student_phone_number: original.student_phone_number.clone(),
                recurring_id: Some(recurring_id.to_string()),
                is_paid: false,
                tips: 0.0,
            };
            kept.push(occurrence.clone());
            result.created.push(occurrence);
        }
        state.lessons = kept;

        // Paid occurrences replaced by fresh unpaid ones are refunded
        let refunds = Refund::aggregate(replaced.iter().filter(|l| l.id != original.id));
        self.balance_service.apply_refunds(state, &refunds)?;
        result.refunded = refunds;

        info!(
            "Rescheduled series {} from {}: {} lesson(s) placed, {} skipped",
            recurring_id,
            pivot,
            result.created.len(),
            result.skipped.len()
        );
        Ok(result)
    }

    /// Change the price of a lesson, or it and the later lessons of its series
    pub fn change_lesson_price(
        &self,
        state: &mut TrackerState,
        lesson_id: &str,
        new_price: f64,
        scope: EditScope,
    ) -> TrackerResult<Vec<Lesson>> {
        self.validate_price(new_price)?;
        let original = state.lesson(lesson_id)?.clone();
        let pivot = original.start();

        let target_ids: Vec<String> = state
            .lessons
            .iter()
            .filter(|l| match (scope, &original.recurring_id) {
                (EditScope::Future, Some(sid)) => l.in_series(sid) && l.start() >= pivot,
                _ => l.id == original.id,
            })
            .map(|l| l.id.clone())
            .collect();

        let mut updated = Vec::with_capacity(target_ids.len());
        for id in target_ids {
            let lesson = state.lesson_mut(&id)?;
            let old_price = lesson.price;
            lesson.price = new_price;
            let snapshot = lesson.clone();
            self.balance_service.price_changed(state, &snapshot, old_price)?;
            updated.push(snapshot);
        }

        info!("Updated price to {:.2} on {} lesson(s)", new_price, updated.len());
        Ok(updated)
    }

    /// Delete a lesson, or it and every later lesson of its series
    pub fn delete_lesson(
        &self,
        state: &mut TrackerState,
        lesson_id: &str,
        scope: EditScope,
    ) -> TrackerResult<DeleteLessonsResult> {
        let target = state.lesson(lesson_id)?.clone();

        // Future deletes compare whole days, not start times
        let (removed, kept): (Vec<Lesson>, Vec<Lesson>) = std::mem::take(&mut state.lessons)
            .into_iter()
            .partition(|l| match (scope, &target.recurring_id) {
                (EditScope::Future, Some(sid)) => l.id == target.id || (l.in_series(sid) && l.date >= target.date),
                _ => l.id == target.id,
            });
        state.lessons = kept;

        let refunds = Refund::aggregate(&removed);
        self.balance_service.apply_refunds(state, &refunds)?;

        info!(
            "Deleted {} lesson(s) starting from {} ({} scope)",
            removed.len(),
            lesson_id,
            scope
        );
        Ok(DeleteLessonsResult { removed, refunded: refunds })
    }

    /// Record tips on a paid lesson; zero clears them
    pub fn set_lesson_tips(&self, state: &mut TrackerState, lesson_id: &str, tips: f64) -> TrackerResult<Lesson> {
        if !tips.is_finite() || tips < 0.0 {
            return Err(TrackerError::InvalidInput(format!("Tips cannot be negative, got {}", tips)));
        }
        let lesson = state.lesson_mut(lesson_id)?;
        if tips > 0.0 && !lesson.is_paid {
            return Err(TrackerError::InvalidInput(
                "Tips can only be recorded on a paid lesson".to_string(),
            ));
        }
        lesson.tips = tips;
        info!("Tips for lesson {} set to {:.2}", lesson_id, tips);
        Ok(lesson.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::balance_service::BalancePolicyKind;
    use crate::backend::domain::test_utils::{date, hour, lesson, series, state_with_ann};

    fn service() -> LessonService {
        LessonService::new(
            &TrackerConfig::default(),
            StudentService::new(),
            BalanceService::new(BalancePolicyKind::Manual),
        )
    }

    fn add_command(name: &str, day: &str, at: &str, duration: f64) -> AddLessonCommand {
        AddLessonCommand {
            student_name: name.to_string(),
            price: 20.0,
            duration,
            date: date(day),
            hour: hour(at),
            student_phone_number: None,
        }
    }

    fn assert_no_overlaps(state: &TrackerState) {
        for a in &state.lessons {
            for b in &state.lessons {
                if a.id != b.id {
                    assert!(
                        !(a.start() < b.end() && a.end() > b.start()),
                        "lessons {} and {} overlap",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }

    fn series_state(count: usize) -> TrackerState {
        let mut state = state_with_ann(0.0);
        state.lessons = series("series::s", "2024-01-01", count);
        state
    }

    #[test]
    fn test_weekly_add_creates_full_series() {
        let service = service();
        let mut state = TrackerState::default();

        let result = service
            .add_lesson(&mut state, add_command("Ann", "2024-01-01", "10:00", 1.0), true)
            .unwrap();

        assert_eq!(result.created.len(), 13);
        assert!(result.skipped.is_empty());
        assert_eq!(state.lessons.len(), 13);
        let recurring_id = result.created[0].recurring_id.clone().unwrap();
        for (i, l) in result.created.iter().enumerate() {
            assert_eq!(l.recurring_id.as_deref(), Some(recurring_id.as_str()));
            assert_eq!(l.date, occurrence_date(date("2024-01-01"), i));
            assert_eq!(l.hour, hour("10:00"));
            assert!(!l.is_paid);
            assert_eq!(l.tips, 0.0);
        }
        assert_eq!(state.students.len(), 1);
        assert_eq!(state.students[0].name, "Ann");
    }

    #[test]
    fn test_single_add_has_no_series() {
        let service = service();
        let mut state = TrackerState::default();
        let result = service
            .add_lesson(&mut state, add_command("Ann", "2024-01-01", "10:00", 1.0), false)
            .unwrap();
        assert_eq!(result.created.len(), 1);
        assert!(result.created[0].recurring_id.is_none());
    }

    #[test]
    fn test_conflicting_first_occurrence_rejects_whole_add() {
        let service = service();
        let mut state = state_with_ann(0.0);
        state.lessons.push(lesson("existing", "2024-01-01", "10:00", 1.0));

        let err = service
            .add_lesson(&mut state, add_command("Bob", "2024-01-01", "10:30", 1.0), true)
            .unwrap_err();

        match err {
            TrackerError::Conflict { conflicting_lesson_id, .. } => assert_eq!(conflicting_lesson_id, "existing"),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(state.lessons.len(), 1);
        assert_eq!(state.students.len(), 1, "Bob must not be created by a rejected add");
    }

    #[test]
    fn test_weekly_add_skips_conflicting_weeks() {
        let service = service();
        let mut state = state_with_ann(0.0);
        state.lessons.push(lesson("blocker", "2024-01-15", "10:30", 0.5));

        let result = service
            .add_lesson(&mut state, add_command("Bob", "2024-01-01", "10:00", 1.0), true)
            .unwrap();

        assert_eq!(result.created.len(), 12);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].date, date("2024-01-15"));
        assert!(result.skipped[0].reason.contains("blocker"));
        assert!(result.created.iter().all(|l| l.date != date("2024-01-15")));
        assert_no_overlaps(&state);
    }

    #[test]
    fn test_add_reuses_existing_student_by_name() {
        let service = service();
        let mut state = state_with_ann(0.0);
        let result = service
            .add_lesson(&mut state, add_command("ANN", "2024-01-01", "10:00", 1.0), false)
            .unwrap();
        assert_eq!(result.created[0].student_id, "student::ann");
        assert_eq!(state.students.len(), 1);
    }

    #[test]
    fn test_add_validates_input() {
        let service = service();
        let mut state = TrackerState::default();

        let mut bad_price = add_command("Ann", "2024-01-01", "10:00", 1.0);
        bad_price.price = 0.0;
        assert!(matches!(service.add_lesson(&mut state, bad_price, false), Err(TrackerError::InvalidInput(_))));

        let bad_duration = add_command("Ann", "2024-01-01", "10:00", 0.75);
        assert!(matches!(service.add_lesson(&mut state, bad_duration, false), Err(TrackerError::InvalidInput(_))));

        assert!(state.lessons.is_empty());
        assert!(state.students.is_empty());
    }

    #[test]
    fn test_blank_phone_number_is_dropped() {
        let service = service();
        let mut state = TrackerState::default();
        let mut command = add_command("Ann", "2024-01-01", "10:00", 1.0);
        command.student_phone_number = Some("   ".to_string());
        let result = service.add_lesson(&mut state, command, false).unwrap();
        assert!(result.created[0].student_phone_number.is_none());
    }

    #[test]
    fn test_suggested_price_uses_latest_lesson() {
        let service = service();
        let mut state = state_with_ann(0.0);
        let mut early = lesson("early", "2024-01-01", "10:00", 1.0);
        early.price = 15.0;
        let mut late = lesson("late", "2024-02-01", "10:00", 1.0);
        late.price = 25.0;
        state.lessons.push(late);
        state.lessons.push(early);

        assert_eq!(service.suggested_price(&state, "ann"), Some(25.0));
        assert_eq!(service.suggested_price(&state, "Bob"), None);
    }

    #[test]
    fn test_future_reschedule_at_fifth_occurrence() {
        let service = service();
        let mut state = series_state(13);
        let before: Vec<Lesson> = state.lessons[..4].to_vec();
        let target_id = state.lessons[4].id.clone();

        let result = service
            .change_lesson_time(&mut state, &target_id, date("2024-01-30"), hour("14:00"), 1.5, EditScope::Future)
            .unwrap();

        assert_eq!(result.created.len(), 9);
        assert!(result.skipped.is_empty());
        assert_eq!(result.created[0].id, target_id);
        for (i, l) in result.created.iter().enumerate() {
            assert_eq!(l.date, occurrence_date(date("2024-01-30"), i));
            assert_eq!(l.hour, hour("14:00"));
            assert_eq!(l.duration, 1.5);
            assert_eq!(l.recurring_id.as_deref(), Some("series::s"));
        }

        assert_eq!(state.lessons.len(), 13);
        for original in &before {
            assert_eq!(state.find_lesson(&original.id), Some(original));
        }
        assert_no_overlaps(&state);
    }

    #[test]
    fn test_future_reschedule_skips_conflicting_slot() {
        let service = service();
        let mut state = series_state(13);
        let mut blocker = lesson("blocker", "2024-02-13", "14:30", 1.0);
        blocker.student_id = "student::ann".to_string();
        state.lessons.push(blocker);
        let target_id = state.lessons[4].id.clone();

        let result = service
            .change_lesson_time(&mut state, &target_id, date("2024-01-30"), hour("14:00"), 1.0, EditScope::Future)
            .unwrap();

        assert_eq!(result.created.len(), 8);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].date, date("2024-02-13"));
        assert_no_overlaps(&state);
    }

    #[test]
    fn test_future_reschedule_ignores_own_later_occurrences() {
        let service = service();
        let mut state = series_state(13);
        let target_id = state.lessons[4].id.clone();
        let next_week = state.lessons[5].date;

        let single = service.change_lesson_time(&mut state.clone(), &target_id, next_week, hour("10:00"), 1.0, EditScope::Single);
        assert!(matches!(single, Err(TrackerError::Conflict { .. })));

        let result = service
            .change_lesson_time(&mut state, &target_id, next_week, hour("10:00"), 1.0, EditScope::Future)
            .unwrap();
        assert_eq!(result.created.len(), 9);
        assert_no_overlaps(&state);
    }

    #[test]
    fn test_future_reschedule_still_blocked_by_earlier_occurrence() {
        let service = service();
        let mut state = series_state(13);
        let target_id = state.lessons[4].id.clone();
        let previous_week = state.lessons[3].date;

        let err = service
            .change_lesson_time(&mut state, &target_id, previous_week, hour("10:30"), 1.0, EditScope::Future)
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict { .. }));
        assert_eq!(state, series_state(13));
    }

    #[test]
    fn test_future_reschedule_resets_regenerated_payment_and_refunds() {
        let service = service();
        let mut state = series_state(4);
        state.students[0].balance = 80.0;
        for l in state.lessons.iter_mut() {
            l.is_paid = true;
        }
        state.lessons[2].tips = 5.0;
        let target_id = state.lessons[1].id.clone();

        let result = service
            .change_lesson_time(&mut state, &target_id, date("2024-01-09"), hour("10:00"), 1.0, EditScope::Future)
            .unwrap();

        assert!(result.created[0].is_paid, "moved lesson keeps its payment");
        assert!(result.created[1..].iter().all(|l| !l.is_paid && l.tips == 0.0));
        assert_eq!(result.refunded.len(), 1);
        assert_eq!(result.refunded[0].amount, 40.0);
        assert_eq!(state.student("student::ann").unwrap().balance, 120.0);
    }

    #[test]
    fn test_future_scope_on_one_off_lesson_acts_as_single() {
        let service = service();
        let mut state = state_with_ann(0.0);
        state.lessons.push(lesson("solo", "2024-01-01", "10:00", 1.0));
        state.lessons.push(lesson("other", "2024-01-08", "10:00", 1.0));

        let result = service
            .change_lesson_time(&mut state, "solo", date("2024-01-02"), hour("09:00"), 2.0, EditScope::Future)
            .unwrap();
        assert_eq!(result.created.len(), 1);
        assert_eq!(state.lessons.len(), 2);
        let moved = state.lesson("solo").unwrap();
        assert_eq!(moved.date, date("2024-01-02"));
        assert_eq!(moved.duration, 2.0);
    }

    #[test]
    fn test_single_reschedule_in_series_touches_only_target() {
        let service = service();
        let mut state = series_state(5);
        let original = state.clone();
        let target_id = state.lessons[2].id.clone();

        service
            .change_lesson_time(&mut state, &target_id, date("2024-01-16"), hour("16:00"), 1.0, EditScope::Single)
            .unwrap();

        for (before, after) in original.lessons.iter().zip(state.lessons.iter()) {
            if before.id == target_id {
                assert_eq!(after.hour, hour("16:00"));
                assert_eq!(after.recurring_id, before.recurring_id);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_reschedule_missing_lesson() {
        let service = service();
        let mut state = TrackerState::default();
        let err = service
            .change_lesson_time(&mut state, "nope", date("2024-01-02"), hour("09:00"), 1.0, EditScope::Single)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_single_occurrence_of_series() {
        let service = service();
        let mut state = series_state(13);
        state.lessons[6].is_paid = true;
        state.students[0].balance = 20.0;
        let target_id = state.lessons[6].id.clone();

        let result = service.delete_lesson(&mut state, &target_id, EditScope::Single).unwrap();

        assert_eq!(result.removed.len(), 1);
        assert_eq!(state.lessons.len(), 12);
        assert!(state.find_lesson(&target_id).is_none());
        assert_eq!(result.refunded.len(), 1);
        assert_eq!(result.refunded[0].amount, 20.0);
        assert_eq!(state.student("student::ann").unwrap().balance, 40.0);
    }

    #[test]
    fn test_delete_future_removes_tail_and_sums_refunds() {
        let service = service();
        let mut state = series_state(13);
        state.students[0].balance = 60.0;
        for i in [2usize, 8, 10] {
            state.lessons[i].is_paid = true;
        }
        let target_id = state.lessons[6].id.clone();

        let result = service.delete_lesson(&mut state, &target_id, EditScope::Future).unwrap();

        assert_eq!(result.removed.len(), 7);
        assert_eq!(state.lessons.len(), 6);
        assert_eq!(result.refunded, vec![Refund { student_id: "student::ann".into(), amount: 40.0 }]);
        assert_eq!(state.student("student::ann").unwrap().balance, 100.0);
    }

    #[test]
    fn test_delete_future_compares_whole_days() {
        let service = service();
        let mut state = series_state(3);
        // An earlier-in-the-day occurrence on the target's date still goes
        let mut same_day = lesson("same-day", "2024-01-08", "08:00", 1.0);
        same_day.recurring_id = Some("series::s".to_string());
        state.lessons.push(same_day);
        let target_id = state.lessons[1].id.clone();

        let result = service.delete_lesson(&mut state, &target_id, EditScope::Future).unwrap();
        assert_eq!(result.removed.len(), 3);
        assert_eq!(state.lessons.len(), 1);
    }

    #[test]
    fn test_delete_future_on_one_off_lesson_acts_as_single() {
        let service = service();
        let mut state = state_with_ann(0.0);
        state.lessons.push(lesson("solo", "2024-01-01", "10:00", 1.0));
        state.lessons.push(lesson("later", "2024-01-08", "10:00", 1.0));

        let result = service.delete_lesson(&mut state, "solo", EditScope::Future).unwrap();
        assert_eq!(result.removed.len(), 1);
        assert_eq!(state.lessons.len(), 1);
    }

    #[test]
    fn test_deleting_paid_lesson_adds_price_back_for_manual_policy() {
        let service = service();
        let balances = BalanceService::new(BalancePolicyKind::Manual);
        let mut state = TrackerState::default();

        let added = service
            .add_lesson(&mut state, add_command("Ann", "2024-01-01", "10:00", 1.0), false)
            .unwrap();
        let lesson_id = added.created[0].id.clone();
        let student_id = added.created[0].student_id.clone();
        balances.apply_top_up(&mut state, &student_id, 80.0).unwrap();
        balances.set_lesson_paid(&mut state, &lesson_id, true).unwrap();
        assert_eq!(state.student(&student_id).unwrap().balance, 100.0);

        let result = service.delete_lesson(&mut state, &lesson_id, EditScope::Single).unwrap();
        assert_eq!(result.refunded[0].amount, 20.0);
        assert_eq!(state.student(&student_id).unwrap().balance, 120.0);
    }

    #[test]
    fn test_deleting_unpaid_lesson_leaves_balance() {
        let service = service();
        let mut state = state_with_ann(100.0);
        state.lessons.push(lesson("a", "2024-01-01", "10:00", 1.0));

        let result = service.delete_lesson(&mut state, "a", EditScope::Single).unwrap();
        assert!(result.refunded.is_empty());
        assert_eq!(state.student("student::ann").unwrap().balance, 100.0);
    }

    #[test]
    fn test_change_price_single_and_future() {
        let service = service();
        let mut state = series_state(6);
        let third = state.lessons[2].id.clone();

        let single = service.change_lesson_price(&mut state, &third, 30.0, EditScope::Single).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(state.lesson(&third).unwrap().price, 30.0);
        assert_eq!(state.lessons[3].price, 20.0);

        let fourth = state.lessons[3].id.clone();
        let future = service.change_lesson_price(&mut state, &fourth, 35.0, EditScope::Future).unwrap();
        assert_eq!(future.len(), 3);
        let prices: Vec<f64> = state.lessons.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![20.0, 20.0, 30.0, 35.0, 35.0, 35.0]);
    }

    #[test]
    fn test_change_price_on_paid_lesson_adjusts_manual_income() {
        let service = service();
        let mut state = state_with_ann(20.0);
        let mut paid = lesson("paid", "2024-01-01", "10:00", 1.0);
        paid.is_paid = true;
        state.lessons.push(paid);

        service.change_lesson_price(&mut state, "paid", 25.0, EditScope::Single).unwrap();
        assert_eq!(state.student("student::ann").unwrap().balance, 25.0);
        assert!(service.change_lesson_price(&mut state, "paid", -1.0, EditScope::Single).is_err());
    }

    #[test]
    fn test_tips_require_paid_lesson() {
        let service = service();
        let mut state = state_with_ann(0.0);
        state.lessons.push(lesson("a", "2024-01-01", "10:00", 1.0));

        assert!(service.set_lesson_tips(&mut state, "a", 5.0).is_err());
        assert!(service.set_lesson_tips(&mut state, "a", 0.0).is_ok());

        state.lesson_mut("a").unwrap().is_paid = true;
        assert_eq!(service.set_lesson_tips(&mut state, "a", 5.0).unwrap().tips, 5.0);
        assert!(service.set_lesson_tips(&mut state, "a", -1.0).is_err());
    }

    #[test]
    fn test_no_overlap_after_mixed_operations() {
        let service = service();
        let mut state = TrackerState::default();

        let ann = service
            .add_lesson(&mut state, add_command("Ann", "2024-01-01", "10:00", 1.0), true)
            .unwrap();
        service
            .add_lesson(&mut state, add_command("Bob", "2024-01-15", "10:30", 1.0), false)
            .unwrap_err();
        service
            .add_lesson(&mut state, add_command("Bob", "2024-01-01", "11:00", 2.0), true)
            .unwrap();
        let _ = service.change_lesson_time(
            &mut state,
            &ann.created[3].id,
            date("2024-01-22"),
            hour("11:30"),
            1.0,
            EditScope::Future,
        );
        service
            .delete_lesson(&mut state, &ann.created[1].id, EditScope::Single)
            .unwrap();
        service
            .add_lesson(&mut state, add_command("Cid", "2024-01-08", "10:00", 1.0), true)
            .unwrap();

        assert_no_overlaps(&state);
    }
}
