//! # Settings Repository
//!
//! Keeps [`AppSettings`] in `settings.yaml` next to the collection files:
//!
//! ```yaml
//! startOfWeekDay: 1
//! darkMode: false
//! currency:
//!   code: UAH
//!   symbol: "₴"
//!   name: Ukrainian Hryvnia
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use shared::AppSettings;

use super::connection::JsonConnection;
use crate::backend::storage::traits::SettingsStorage;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    connection: JsonConnection,
}

impl SettingsRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl SettingsStorage for SettingsRepository {
    fn load_settings(&self) -> Result<AppSettings> {
        let path = self.connection.settings_path();
        match self.connection.read_if_exists(&path)? {
            Some(yaml_content) => {
                let settings: AppSettings = serde_yaml::from_str(&yaml_content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            None => {
                debug!("No settings file yet, using defaults");
                Ok(AppSettings::default())
            }
        }
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let yaml_content = serde_yaml::to_string(settings)?;
        self.connection.write_atomic(&self.connection.settings_path(), &yaml_content)?;
        info!(
            "Saved settings (week starts on {}, currency {})",
            settings.start_of_week_day, settings.currency.code
        );
        Ok(())
    }
}
