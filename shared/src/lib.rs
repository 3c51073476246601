//! Wire and persisted types shared between the tutor tracker backend and its UI.
//!
//! Everything here serializes in camelCase so the stored JSON matches what the
//! browser build of the tracker keeps in local storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Student as persisted in `students.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Hex colour from the roster palette, e.g. "#FF6B6B"
    pub color: String,
    /// Net income collected or prepaid credit, depending on the balance policy
    pub balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    /// RFC 3339 timestamp of when the student was archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_date: Option<String>,
}

/// Lesson as persisted in `lessons.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Start time (HH:MM)
    pub hour: String,
    pub student_id: String,
    pub price: f64,
    /// Length in hours (0.5, 1, 1.5, 2)
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<String>,
    pub is_paid: bool,
    pub tips: f64,
}

/// Which part of a recurring series an edit or delete applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    /// Only the selected occurrence
    Single,
    /// The selected occurrence and every later one in its series
    Future,
}

impl fmt::Display for EditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditScope::Single => write!(f, "single"),
            EditScope::Future => write!(f, "future"),
        }
    }
}

/// How a student leaves the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// Soft delete: the record is kept with `isArchived` set
    Archive,
    /// Hard delete: the record is removed
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            code: "UAH".to_string(),
            symbol: "₴".to_string(),
            name: "Ukrainian Hryvnia".to_string(),
        }
    }
}

/// User-facing preferences, persisted alongside the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// 0 = Sunday, 1 = Monday
    pub start_of_week_day: u8,
    pub dark_mode: bool,
    pub currency: Currency,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            start_of_week_day: 0,
            dark_mode: false,
            currency: Currency::default(),
        }
    }
}

/// Request to add a lesson by typed student name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLessonRequest {
    pub student_name: String,
    pub price: f64,
    pub duration: f64,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub hour: String,
    #[serde(default)]
    pub student_phone_number: Option<String>,
}

/// Full data set exchanged with the remote store and used for export files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub students: Vec<Student>,
    pub lessons: Vec<Lesson>,
    pub settings: AppSettings,
    /// RFC 3339
    pub last_modified: String,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
    #[serde(default)]
    pub last_sync_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}
