//! Temporary data directories for storage tests.
//!
//! The directory is removed when the environment is dropped, even if the
//! test panics.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::JsonConnection;
use super::settings_repository::SettingsRepository;
use super::tracker_repository::JsonTrackerRepository;

pub struct TestEnvironment {
    pub connection: JsonConnection,
    pub base_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = JsonConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }

    pub fn tracker_repository(&self) -> JsonTrackerRepository {
        JsonTrackerRepository::new(self.connection.clone())
    }

    pub fn settings_repository(&self) -> SettingsRepository {
        SettingsRepository::new(self.connection.clone())
    }

    /// Drop a hand-written file into the data directory
    pub fn write_raw(&self, file_name: &str, content: &str) {
        fs::write(self.base_path.join(file_name), content).expect("write test fixture");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() -> Result<()> {
        let base_path;
        {
            let env = TestEnvironment::new()?;
            base_path = env.base_path.clone();
            assert!(base_path.exists());
        }
        assert!(!base_path.exists());
        Ok(())
    }
}
