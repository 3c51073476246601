//! # Domain Module
//!
//! Business rules of the tracker, independent of how data is stored or shown.
//!
//! All services operate on a [`TrackerState`](models::TrackerState) passed in
//! by the caller rather than owning storage themselves. The facade in
//! [`crate::backend::tracker`] hands them a working copy and only keeps the
//! result when the whole operation succeeded.
//!
//! - [`lesson_service`]: adds, weekly series, reschedules, price changes, deletes
//! - [`student_service`]: roster lookups, colours, archive and delete
//! - [`balance_service`]: the active balance policy and reconciliation
//! - [`report_service`]: per-student reports and CSV export
//! - [`sync_service`]: remote sync and JSON export/import
//! - [`conflict`]: time-slot overlap checks

pub mod balance_service;
pub mod commands;
pub mod conflict;
pub mod errors;
pub mod lesson_service;
pub mod models;
pub mod report_service;
pub mod student_service;
pub mod sync_service;

#[cfg(test)]
pub mod test_utils;

pub use balance_service::{BalancePolicyKind, BalanceService};
pub use errors::{TrackerError, TrackerResult};
pub use lesson_service::LessonService;
pub use report_service::ReportService;
pub use student_service::StudentService;
pub use sync_service::SyncService;
