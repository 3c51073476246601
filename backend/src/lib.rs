//! Tutor tracker backend: lesson scheduling, recurring series and student
//! balance bookkeeping, persisted to a local data directory.

pub mod backend;
pub mod config;
pub mod logging;

pub use backend::{initialize_backend, AppState, TutorTracker};
pub use config::TrackerConfig;
