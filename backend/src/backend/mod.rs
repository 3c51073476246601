//! # Backend Module
//!
//! Wires the domain services, the JSON data directory and the settings file
//! into an [`AppState`] that a UI (or the CLI binary) can drive.
//!
//! - [`domain`]: scheduling and balance rules
//! - [`storage`]: persistence traits and their JSON/YAML implementations
//! - [`io`]: DTO mappers between `shared` types and domain models
//! - [`tracker`]: the transactional facade over all of the above

use anyhow::{Context, Result};
use log::info;

pub mod domain;
pub mod io;
pub mod storage;
pub mod tracker;

pub use storage::json::{JsonConnection, JsonTrackerRepository, SettingsRepository};
pub use tracker::TutorTracker;

use crate::config::TrackerConfig;

/// Everything a front end needs to operate on one data directory
pub struct AppState {
    pub tracker: TutorTracker<JsonTrackerRepository>,
    pub settings_repository: SettingsRepository,
}

/// Open the configured data directory and load the tracker from it
pub fn initialize_backend(config: &TrackerConfig) -> Result<AppState> {
    let data_directory = config.resolve_data_directory()?;
    let connection = JsonConnection::new(&data_directory)
        .with_context(|| format!("Failed to open data directory {}", data_directory.display()))?;
    info!("Using data directory {}", connection.base_directory().display());

    let tracker = TutorTracker::open(JsonTrackerRepository::new(connection.clone()), config)?;
    let settings_repository = SettingsRepository::new(connection);

    Ok(AppState {
        tracker,
        settings_repository,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::traits::SettingsStorage;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_backend_in_configured_directory() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("tutor");
        let config = TrackerConfig {
            data_directory: Some(data_dir.clone()),
            ..TrackerConfig::default()
        };

        let state = initialize_backend(&config).unwrap();
        assert!(data_dir.is_dir());
        assert!(state.tracker.lessons().is_empty());
        assert_eq!(
            state.settings_repository.load_settings().unwrap(),
            shared::AppSettings::default()
        );
    }
}
