//! Cloud sync and file export/import.
//!
//! The remote store is injected, so the tracker works fully offline and tests
//! run against [`InMemoryRemoteStore`](crate::backend::storage::InMemoryRemoteStore).
//! A failed remote call never touches local data; it only leaves the change
//! counted as pending.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{AppSettings, AuthCredentials, Lesson, SignUpRequest, Student, TrackerSnapshot, User};
use std::sync::Arc;

use super::errors::{TrackerError, TrackerResult};
use crate::backend::storage::traits::RemoteStore;

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub pending_changes: u32,
    pub last_sync_time: Option<DateTime<Utc>>,
}

/// Contents of an export file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedData {
    pub students: Vec<Student>,
    pub lessons: Vec<Lesson>,
    pub settings: AppSettings,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

pub struct SyncService<R: RemoteStore> {
    remote: Arc<R>,
    current_user: Option<User>,
    status: SyncStatus,
}

impl<R: RemoteStore> SyncService<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            current_user: None,
            status: SyncStatus::default(),
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Sign in, then fetch the user's latest snapshot so the caller can
    /// replace local data with it
    pub async fn sign_in(&mut self, credentials: &AuthCredentials) -> TrackerResult<(User, Option<TrackerSnapshot>)> {
        let user = self
            .remote
            .sign_in(credentials)
            .await
            .map_err(|e| TrackerError::RemoteSync(format!("Sign in failed: {:#}", e)))?;

        let snapshot = self
            .remote
            .download_on_sign_in(&user.id)
            .await
            .map_err(|e| TrackerError::RemoteSync(format!("Download after sign in failed: {:#}", e)))?;

        info!(
            "Signed in as {} ({})",
            user.email,
            if snapshot.is_some() { "remote data found" } else { "no remote data" }
        );
        self.current_user = Some(user.clone());
        Ok((user, snapshot))
    }

    /// New accounts start with nothing to download
    pub async fn sign_up(&mut self, request: &SignUpRequest) -> TrackerResult<User> {
        let user = self
            .remote
            .sign_up(request)
            .await
            .map_err(|e| TrackerError::RemoteSync(format!("Sign up failed: {:#}", e)))?;
        info!("Signed up as {}", user.email);
        self.current_user = Some(user.clone());
        Ok(user)
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.current_user.take() {
            info!("Signed out {}", user.email);
        }
        self.status = SyncStatus::default();
    }

    /// Record a local change that has not reached the remote store yet
    pub fn mark_pending(&mut self) {
        self.status.pending_changes += 1;
    }

    /// Upload the full data set as a new snapshot
    pub async fn push(
        &mut self,
        students: Vec<Student>,
        lessons: Vec<Lesson>,
        settings: AppSettings,
    ) -> TrackerResult<TrackerSnapshot> {
        let user_id = self
            .current_user
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or_else(|| TrackerError::RemoteSync("Not signed in".to_string()))?;

        let now = Utc::now();
        let snapshot = TrackerSnapshot {
            students,
            lessons,
            settings,
            last_modified: now.to_rfc3339(),
            version: now.timestamp_millis(),
        };

        self.status.is_syncing = true;
        let result = self.remote.sync_data(&user_id, &snapshot).await;
        self.status.is_syncing = false;

        match result {
            Ok(stored) => {
                self.status.pending_changes = 0;
                self.status.last_sync_time = Some(now);
                info!("Synced {} students and {} lessons", stored.students.len(), stored.lessons.len());
                Ok(stored)
            }
            Err(e) => {
                self.status.pending_changes = self.status.pending_changes.max(1);
                warn!("Sync failed, local data kept: {:#}", e);
                Err(TrackerError::RemoteSync(format!("Sync failed: {:#}", e)))
            }
        }
    }
}

/// Pretty-printed JSON export of the full data set
pub fn export_data(
    students: &[Student],
    lessons: &[Lesson],
    settings: &AppSettings,
    exported_at: DateTime<Utc>,
) -> TrackerResult<String> {
    let data = ExportedData {
        students: students.to_vec(),
        lessons: lessons.to_vec(),
        settings: settings.clone(),
        exported_at: Some(exported_at.to_rfc3339()),
        version: Some(EXPORT_FORMAT_VERSION.to_string()),
    };
    serde_json::to_string_pretty(&data).map_err(|e| TrackerError::Storage(e.into()))
}

/// Parse an export file; `students`, `lessons` and `settings` must all be present
pub fn import_data(json: &str) -> TrackerResult<ExportedData> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| TrackerError::MalformedData(format!("Import is not valid JSON: {}", e)))?;

    let missing: Vec<&str> = ["students", "lessons", "settings"]
        .into_iter()
        .filter(|key| value.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(TrackerError::MalformedData(format!(
            "Import is missing required keys: {}",
            missing.join(", ")
        )));
    }

    let data: ExportedData =
        serde_json::from_value(value).map_err(|e| TrackerError::MalformedData(format!("Invalid import data: {}", e)))?;
    info!(
        "Parsed import with {} students and {} lessons (format {})",
        data.students.len(),
        data.lessons.len(),
        data.version.as_deref().unwrap_or("unknown")
    );
    Ok(data)
}
