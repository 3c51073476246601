//! # Tracker Configuration
//!
//! Optional `tracker_config.yaml`; every field has a default, so a missing
//! file or a partial one is fine:
//!
//! ```yaml
//! data_directory: "/home/me/Documents/Tutor Tracker"
//! balance_policy: manual        # or "prepaid"
//! recurring_weeks_total: 13
//! allowed_durations: [0.5, 1.0, 1.5, 2.0]
//! ```
//!
//! The data directory is resolved from the `TUTOR_TRACKER_DATA_DIR`
//! environment variable first, then the file, then `~/Documents/Tutor Tracker`.

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::domain::BalancePolicyKind;

pub const DATA_DIR_ENV_VAR: &str = "TUTOR_TRACKER_DATA_DIR";
pub const CONFIG_FILE_NAME: &str = "tracker_config.yaml";
pub const DEFAULT_DATA_DIR_NAME: &str = "Tutor Tracker";
pub const DEFAULT_RECURRING_WEEKS_TOTAL: usize = 13;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub data_directory: Option<PathBuf>,
    pub balance_policy: BalancePolicyKind,
    /// Occurrences created by a weekly add, the first one included
    pub recurring_weeks_total: usize,
    /// Lesson lengths in hours that the tracker accepts
    pub allowed_durations: Vec<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            balance_policy: BalancePolicyKind::default(),
            recurring_weeks_total: DEFAULT_RECURRING_WEEKS_TOTAL,
            allowed_durations: vec![0.5, 1.0, 1.5, 2.0],
        }
    }
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let yaml_content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: TrackerConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// `<config dir>/tutor-tracker/tracker_config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tutor-tracker").join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.recurring_weeks_total == 0 {
            bail!("recurring_weeks_total must be at least 1");
        }
        if self.allowed_durations.is_empty() {
            bail!("allowed_durations cannot be empty");
        }
        if let Some(bad) = self.allowed_durations.iter().find(|d| !d.is_finite() || **d <= 0.0) {
            bail!("allowed_durations must be positive, found {}", bad);
        }
        Ok(())
    }

    pub fn resolve_data_directory(&self) -> Result<PathBuf> {
        self.resolve_data_directory_with(std::env::var(DATA_DIR_ENV_VAR).ok())
    }

    fn resolve_data_directory_with(&self, env_override: Option<String>) -> Result<PathBuf> {
        if let Some(dir) = env_override.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()) {
            debug!("Using data directory from {}: {}", DATA_DIR_ENV_VAR, dir);
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.data_directory {
            return Ok(dir.clone());
        }
        dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
            .map(|documents| documents.join(DEFAULT_DATA_DIR_NAME))
            .ok_or_else(|| anyhow!("Could not determine home directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.recurring_weeks_total, 13);
        assert_eq!(config.balance_policy, BalancePolicyKind::Manual);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "balance_policy: prepaid\nrecurring_weeks_total: 4\n").unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.balance_policy, BalancePolicyKind::Prepaid);
        assert_eq!(config.recurring_weeks_total, 4);
        assert_eq!(config.allowed_durations, vec![0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = TrackerConfig::load_or_default(&temp_dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config, TrackerConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        fs::write(&path, "recurring_weeks_total: 0\n").unwrap();
        assert!(TrackerConfig::load(&path).is_err());

        fs::write(&path, "allowed_durations: [1.0, -0.5]\n").unwrap();
        assert!(TrackerConfig::load(&path).is_err());

        fs::write(&path, "balance_policy: barter\n").unwrap();
        assert!(TrackerConfig::load(&path).is_err());
    }

    #[test]
    fn test_data_directory_precedence() {
        let mut config = TrackerConfig::default();
        config.data_directory = Some(PathBuf::from("/from/config"));

        assert_eq!(
            config.resolve_data_directory_with(Some("/from/env".to_string())).unwrap(),
            PathBuf::from("/from/env")
        );
        assert_eq!(
            config.resolve_data_directory_with(Some("  ".to_string())).unwrap(),
            PathBuf::from("/from/config")
        );

        config.data_directory = None;
        if let Ok(default_dir) = config.resolve_data_directory_with(None) {
            assert!(default_dir.ends_with(DEFAULT_DATA_DIR_NAME));
        }
    }
}
