//! # JSON Storage Module
//!
//! File-based storage in a single data directory:
//!
//! ```text
//! Tutor Tracker/
//! ├── students.json
//! ├── lessons.json
//! └── settings.yaml
//! ```
//!
//! The collection files hold camelCase JSON arrays matching the `shared`
//! types. Every write goes to a temp file first and is renamed into place.

pub mod connection;
pub mod settings_repository;
pub mod tracker_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use settings_repository::SettingsRepository;
pub use tracker_repository::JsonTrackerRepository;
