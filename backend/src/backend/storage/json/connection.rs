use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

const STUDENTS_FILE: &str = "students.json";
const LESSONS_FILE: &str = "lessons.json";
const SETTINGS_FILE: &str = "settings.yaml";

/// JsonConnection owns the data directory and the file layout inside it
#[derive(Debug, Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Open a data directory, creating it if it doesn't exist
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
            info!("Created data directory: {}", base_path.display());
        }
        Ok(Self { base_directory: base_path })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn students_path(&self) -> PathBuf {
        self.base_directory.join(STUDENTS_FILE)
    }

    pub fn lessons_path(&self) -> PathBuf {
        self.base_directory.join(LESSONS_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base_directory.join(SETTINGS_FILE)
    }

    /// File contents, or `None` when the file has never been written
    pub fn read_if_exists(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    /// Write via temp file + rename so readers never see a partial file
    pub fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
