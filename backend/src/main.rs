use anyhow::Result;
use log::{info, warn};
use std::path::PathBuf;

use tutor_tracker_backend::backend::storage::traits::SettingsStorage;
use tutor_tracker_backend::logging::init_logging;
use tutor_tracker_backend::{initialize_backend, TrackerConfig};

/// Loads the tracker and prints a summary of the roster. An explicit config
/// path may be passed as the first argument.
fn main() -> Result<()> {
    init_logging();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(TrackerConfig::default_path);
    let config = match &config_path {
        Some(path) => TrackerConfig::load_or_default(path)?,
        None => {
            warn!("No config directory available, using defaults");
            TrackerConfig::default()
        }
    };

    let state = initialize_backend(&config)?;
    let settings = state.settings_repository.load_settings()?;
    let tracker = &state.tracker;

    info!(
        "{} students, {} lessons, {} balance policy, currency {}",
        tracker.students().len(),
        tracker.lessons().len(),
        tracker.balance_policy(),
        settings.currency.code
    );
    for student in tracker.students().iter().filter(|s| !s.is_archived) {
        let lessons = tracker.state().lessons_for_student(&student.id);
        let unpaid = lessons.iter().filter(|l| !l.is_paid).count();
        println!(
            "{:<24} {:>10.2} {}  {} lessons ({} unpaid)",
            student.name,
            student.balance,
            settings.currency.symbol,
            lessons.len(),
            unpaid
        );
    }

    Ok(())
}
