//! Balance bookkeeping for students.
//!
//! Two policies exist and exactly one is active for a tracker:
//!
//! - **Manual** (`ManualIncomePolicy`): the balance is the income collected
//!   from a student. Lessons stay unpaid until the tutor marks them paid,
//!   which adds the price to the balance and unmarking reverses it. Paid
//!   lessons that are deleted or purged are refunded: their price is added
//!   back to the balance.
//! - **Prepaid** (`PrepaidCreditPolicy`): the balance is credit the student
//!   has paid in advance. Paid lessons consume that credit, and after every
//!   mutation the unpaid lessons are paid oldest-first while credit remains.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::commands::lessons::Refund;
use super::errors::{TrackerError, TrackerResult};
use super::models::{Lesson, Student, TrackerState};

/// Tolerance used when comparing money amounts
pub const BALANCE_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalancePolicyKind {
    #[default]
    Manual,
    Prepaid,
}

impl fmt::Display for BalancePolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalancePolicyKind::Manual => write!(f, "manual"),
            BalancePolicyKind::Prepaid => write!(f, "prepaid"),
        }
    }
}

/// Rules tying a student's balance to the paid state of their lessons
pub trait BalancePolicy: Send + Sync + fmt::Debug {
    fn kind(&self) -> BalancePolicyKind;

    /// Adjust a student's balance directly
    fn apply_top_up(&self, state: &mut TrackerState, student_id: &str, amount: f64) -> TrackerResult<Student>;

    /// Mark a lesson paid or unpaid, updating the balance in the same step
    fn set_lesson_paid(&self, state: &mut TrackerState, lesson_id: &str, paid: bool) -> TrackerResult<Lesson>;

    /// Credit the balance for paid lessons that were removed or replaced
    fn refund(&self, state: &mut TrackerState, refund: &Refund) -> TrackerResult<()>;

    /// React to the price of `lesson` changing from `old_price`
    fn price_changed(&self, state: &mut TrackerState, lesson: &Lesson, old_price: f64) -> TrackerResult<()>;

    /// Recompute paid flags after any lesson or student mutation
    fn reconcile_after_mutation(&self, lessons: Vec<Lesson>, students: &[Student]) -> Vec<Lesson>;
}

fn validate_amount(amount: f64) -> TrackerResult<()> {
    if !amount.is_finite() || amount.abs() < BALANCE_EPSILON {
        return Err(TrackerError::InvalidInput(format!(
            "Amount must be a non-zero number, got {}",
            amount
        )));
    }
    Ok(())
}

/// Post-payment model: the balance is income received.
#[derive(Debug, Clone, Default)]
pub struct ManualIncomePolicy;

impl BalancePolicy for ManualIncomePolicy {
    fn kind(&self) -> BalancePolicyKind {
        BalancePolicyKind::Manual
    }

    fn apply_top_up(&self, state: &mut TrackerState, student_id: &str, amount: f64) -> TrackerResult<Student> {
        validate_amount(amount)?;
        let student = state.adjust_balance(student_id, amount)?;
        info!(
            "Adjusted income for {} by {:.2}, balance now {:.2}",
            student.name, amount, student.balance
        );
        Ok(student.clone())
    }

    fn set_lesson_paid(&self, state: &mut TrackerState, lesson_id: &str, paid: bool) -> TrackerResult<Lesson> {
        let lesson = state.lesson(lesson_id)?.clone();
        if lesson.is_paid == paid {
            debug!("Lesson {} already has paid={}, nothing to do", lesson_id, paid);
            return Ok(lesson);
        }

        let delta = if paid { lesson.price } else { -lesson.price };
        state.adjust_balance(&lesson.student_id, delta)?;

        let updated = state.lesson_mut(lesson_id)?;
        if paid {
            updated.is_paid = true;
        } else {
            updated.clear_payment();
        }
        info!("Lesson {} marked paid={}, balance changed by {:.2}", lesson_id, paid, delta);
        Ok(updated.clone())
    }

    fn refund(&self, state: &mut TrackerState, refund: &Refund) -> TrackerResult<()> {
        match state.adjust_balance(&refund.student_id, refund.amount) {
            Ok(student) => {
                info!(
                    "Refunded {:.2} to {}, balance now {:.2}",
                    refund.amount, student.name, student.balance
                );
                Ok(())
            }
            Err(TrackerError::StudentNotFound(id)) => {
                warn!("Cannot refund {:.2} to missing student {}", refund.amount, id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn price_changed(&self, state: &mut TrackerState, lesson: &Lesson, old_price: f64) -> TrackerResult<()> {
        if lesson.is_paid {
            state.adjust_balance(&lesson.student_id, lesson.price - old_price)?;
        }
        Ok(())
    }

    fn reconcile_after_mutation(&self, lessons: Vec<Lesson>, _students: &[Student]) -> Vec<Lesson> {
        lessons
    }
}

/// Prepaid model: the balance is credit, consumed by paid lessons.
#[derive(Debug, Clone, Default)]
pub struct PrepaidCreditPolicy;

impl PrepaidCreditPolicy {
    /// Credit not yet consumed by paid lessons
    pub fn available_credit(state: &TrackerState, student_id: &str) -> TrackerResult<f64> {
        let student = state.student(student_id)?;
        Ok(student.balance - state.paid_total(student_id))
    }
}

impl BalancePolicy for PrepaidCreditPolicy {
    fn kind(&self) -> BalancePolicyKind {
        BalancePolicyKind::Prepaid
    }

    fn apply_top_up(&self, state: &mut TrackerState, student_id: &str, amount: f64) -> TrackerResult<Student> {
        validate_amount(amount)?;
        if amount < 0.0 {
            return Err(TrackerError::InvalidInput(
                "Prepaid credit can only be topped up with a positive amount".to_string(),
            ));
        }
        let student = state.adjust_balance(student_id, amount)?;
        info!(
            "Added {:.2} prepaid credit for {}, balance now {:.2}",
            amount, student.name, student.balance
        );
        Ok(student.clone())
    }

    fn set_lesson_paid(&self, state: &mut TrackerState, lesson_id: &str, paid: bool) -> TrackerResult<Lesson> {
        let lesson = state.lesson(lesson_id)?.clone();
        if lesson.is_paid == paid {
            debug!("Lesson {} already has paid={}, nothing to do", lesson_id, paid);
            return Ok(lesson);
        }

        if paid {
            let available = Self::available_credit(state, &lesson.student_id)?;
            if available + BALANCE_EPSILON < lesson.price {
                warn!(
                    "Refusing to mark lesson {} paid: available {:.2}, price {:.2}",
                    lesson_id, available, lesson.price
                );
                return Err(TrackerError::InsufficientBalance {
                    student_id: lesson.student_id,
                    available,
                    required: lesson.price,
                });
            }
        } else {
            state.student(&lesson.student_id)?;
        }

        // Credit is derived from the paid flags, so only the lesson changes
        let updated = state.lesson_mut(lesson_id)?;
        if paid {
            updated.is_paid = true;
        } else {
            updated.clear_payment();
        }
        info!("Lesson {} marked paid={} against prepaid credit", lesson_id, paid);
        Ok(updated.clone())
    }

    fn refund(&self, _state: &mut TrackerState, refund: &Refund) -> TrackerResult<()> {
        debug!(
            "Released {:.2} of consumed credit for {}",
            refund.amount, refund.student_id
        );
        Ok(())
    }

    fn price_changed(&self, _state: &mut TrackerState, _lesson: &Lesson, _old_price: f64) -> TrackerResult<()> {
        Ok(())
    }

    fn reconcile_after_mutation(&self, mut lessons: Vec<Lesson>, students: &[Student]) -> Vec<Lesson> {
        for student in students.iter().filter(|s| !s.is_archived) {
            let consumed: f64 = lessons
                .iter()
                .filter(|l| l.student_id == student.id && l.is_paid)
                .map(|l| l.price)
                .sum();
            let mut remaining = student.balance - consumed;

            let mut unpaid: Vec<usize> = lessons
                .iter()
                .enumerate()
                .filter(|(_, l)| l.student_id == student.id && !l.is_paid)
                .map(|(i, _)| i)
                .collect();
            unpaid.sort_by_key(|&i| lessons[i].start());

            // A shortfall does not stop the scan; a later cheaper lesson may still fit
            for index in unpaid {
                let lesson = &mut lessons[index];
                if remaining + BALANCE_EPSILON >= lesson.price {
                    lesson.is_paid = true;
                    remaining -= lesson.price;
                    debug!("Allocated credit to lesson {} ({:.2} left)", lesson.id, remaining);
                }
            }
        }
        lessons
    }
}

/// Front for whichever balance policy the tracker is configured with
#[derive(Debug, Clone)]
pub struct BalanceService {
    policy: Arc<dyn BalancePolicy>,
}

impl BalanceService {
    pub fn new(kind: BalancePolicyKind) -> Self {
        let policy: Arc<dyn BalancePolicy> = match kind {
            BalancePolicyKind::Manual => Arc::new(ManualIncomePolicy),
            BalancePolicyKind::Prepaid => Arc::new(PrepaidCreditPolicy),
        };
        info!("Balance service using {} policy", kind);
        Self { policy }
    }

    pub fn kind(&self) -> BalancePolicyKind {
        self.policy.kind()
    }

    pub fn apply_top_up(&self, state: &mut TrackerState, student_id: &str, amount: f64) -> TrackerResult<Student> {
        self.policy.apply_top_up(state, student_id, amount)
    }

    pub fn set_lesson_paid(&self, state: &mut TrackerState, lesson_id: &str, paid: bool) -> TrackerResult<Lesson> {
        self.policy.set_lesson_paid(state, lesson_id, paid)
    }

    /// Apply each refund once
    pub fn apply_refunds(&self, state: &mut TrackerState, refunds: &[Refund]) -> TrackerResult<()> {
        for refund in refunds {
            self.policy.refund(state, refund)?;
        }
        Ok(())
    }

    pub fn price_changed(&self, state: &mut TrackerState, lesson: &Lesson, old_price: f64) -> TrackerResult<()> {
        self.policy.price_changed(state, lesson, old_price)
    }

    pub fn reconcile(&self, state: &mut TrackerState) {
        let lessons = std::mem::take(&mut state.lessons);
        state.lessons = self.policy.reconcile_after_mutation(lessons, &state.students);
    }

    pub fn reconcile_after_mutation(&self, lessons: Vec<Lesson>, students: &[Student]) -> Vec<Lesson> {
        self.policy.reconcile_after_mutation(lessons, students)
    }

    /// Diagnostic: lessons carrying tips while unpaid or with negative tips
    pub fn validate_tips(&self, state: &TrackerState) -> Vec<String> {
        let errors: Vec<String> = state
            .lessons
            .iter()
            .filter(|l| l.tips < 0.0 || (l.tips > 0.0 && !l.is_paid))
            .map(|l| format!("Lesson {} has tips {:.2} while paid={}", l.id, l.tips, l.is_paid))
            .collect();
        if !errors.is_empty() {
            warn!("Found {} lessons with inconsistent tips", errors.len());
        }
        errors
    }
}
