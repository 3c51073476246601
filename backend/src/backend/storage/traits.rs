//! # Storage Traits
//!
//! Abstractions that let the facade run against the JSON data directory in
//! production and against temporary directories or in-memory fakes in tests.

use anyhow::Result;
use async_trait::async_trait;
use shared::{AppSettings, AuthCredentials, Lesson, SignUpRequest, Student, TrackerSnapshot, User};

/// Both persisted collections, as read from storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredCollections {
    pub students: Vec<Student>,
    pub lessons: Vec<Lesson>,
}

/// Which collections a save actually wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub students_written: bool,
    pub lessons_written: bool,
}

/// Whole-collection persistence for students and lessons
///
/// Loads are lenient: malformed entries are dropped with a warning rather
/// than failing the load. Saves overwrite each collection in full.
pub trait TrackerStorage: Send + Sync {
    fn load(&self) -> Result<StoredCollections>;

    /// Persist both collections. A collection that is empty while the stored
    /// one is not is left untouched and reported as not written.
    fn save(&self, students: &[Student], lessons: &[Lesson]) -> Result<SaveOutcome>;
}

pub trait SettingsStorage: Send + Sync {
    /// Stored settings, or defaults when none were saved yet
    fn load_settings(&self) -> Result<AppSettings>;

    fn save_settings(&self, settings: &AppSettings) -> Result<()>;
}

/// Cloud account and snapshot store used for multi-device sync
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn sign_in(&self, credentials: &AuthCredentials) -> Result<User>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<User>;

    /// Latest snapshot stored for the user, if any
    async fn download_on_sign_in(&self, user_id: &str) -> Result<Option<TrackerSnapshot>>;

    /// Upload a snapshot; returns what the store now holds
    async fn sync_data(&self, user_id: &str, snapshot: &TrackerSnapshot) -> Result<TrackerSnapshot>;
}
