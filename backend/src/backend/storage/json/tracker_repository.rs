//! # JSON Tracker Repository
//!
//! Reads and writes `students.json` and `lessons.json`.
//!
//! Loading is deliberately forgiving because the files may have been written
//! by older versions of the tracker or edited by hand:
//!
//! - entries missing an identity field (`id`, and for lessons `date`, `hour`,
//!   `studentId`) are dropped
//! - other missing fields fall back to defaults (`price` 0, `duration` 1,
//!   `isPaid` false, `tips` 0, `name` "Unknown Student", first palette colour,
//!   `balance` 0); so does a `duration` that is not a positive number of
//!   hours within a day
//! - a file that is not a JSON array is ignored and the collection starts empty
//!
//! Saving never replaces a non-empty file with an empty array.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::{Lesson, Student};
use std::path::Path;
use std::sync::Mutex;

use super::connection::JsonConnection;
use crate::backend::domain::models::lesson::is_valid_duration;
use crate::backend::domain::models::student::VIBRANT_COLORS;
use crate::backend::storage::traits::{SaveOutcome, StoredCollections, TrackerStorage};

const UNKNOWN_STUDENT_NAME: &str = "Unknown Student";
const DEFAULT_DURATION_HOURS: f64 = 1.0;

pub struct JsonTrackerRepository {
    connection: JsonConnection,
    save_lock: Mutex<()>,
}

impl JsonTrackerRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self {
            connection,
            save_lock: Mutex::new(()),
        }
    }

    pub fn connection(&self) -> &JsonConnection {
        &self.connection
    }

    /// Raw array entries of a collection file, empty when unreadable
    fn read_entries(&self, path: &Path, label: &str) -> Result<Vec<Value>> {
        let Some(content) = self.connection.read_if_exists(path)? else {
            debug!("No {} file yet at {}", label, path.display());
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => {
                warn!("{} is not a JSON array; starting with no {}", path.display(), label);
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("Failed to parse {}: {}; starting with no {}", path.display(), e, label);
                Ok(Vec::new())
            }
        }
    }

    fn has_stored_entries(&self, path: &Path, label: &str) -> Result<bool> {
        Ok(!self.read_entries(path, label)?.is_empty())
    }

    fn write_collection<T: Serialize>(&self, path: &Path, items: &[T], label: &str) -> Result<bool> {
        if items.is_empty() && self.has_stored_entries(path, label)? {
            warn!("Refusing to overwrite stored {} with an empty list", label);
            return Ok(false);
        }
        let json = serde_json::to_string_pretty(items)?;
        self.connection.write_atomic(path, &json)?;
        debug!("Saved {} {} to {}", items.len(), label, path.display());
        Ok(true)
    }
}

fn required_str(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_str(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

fn number_or(entry: &Map<String, Value>, key: &str, default: f64) -> f64 {
    entry.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn student_from_entry(value: &Value) -> Option<Student> {
    let entry = value.as_object()?;
    Some(Student {
        id: required_str(entry, "id")?,
        name: required_str(entry, "name").unwrap_or_else(|| UNKNOWN_STUDENT_NAME.to_string()),
        color: required_str(entry, "color").unwrap_or_else(|| VIBRANT_COLORS[0].to_string()),
        balance: number_or(entry, "balance", 0.0),
        is_archived: entry.get("isArchived").and_then(Value::as_bool),
        archived_date: optional_str(entry, "archivedDate"),
    })
}

fn lesson_from_entry(value: &Value) -> Option<Lesson> {
    let entry = value.as_object()?;
    let id = required_str(entry, "id")?;
    let mut duration = number_or(entry, "duration", DEFAULT_DURATION_HOURS);
    if !is_valid_duration(duration) {
        warn!("Lesson {} has duration {}; using {}h", id, duration, DEFAULT_DURATION_HOURS);
        duration = DEFAULT_DURATION_HOURS;
    }
    Some(Lesson {
        id,
        date: required_str(entry, "date")?,
        hour: required_str(entry, "hour")?,
        student_id: required_str(entry, "studentId")?,
        price: number_or(entry, "price", 0.0),
        duration,
        student_phone_number: optional_str(entry, "studentPhoneNumber"),
        recurring_id: optional_str(entry, "recurringId"),
        is_paid: entry.get("isPaid").and_then(Value::as_bool).unwrap_or(false),
        tips: number_or(entry, "tips", 0.0),
    })
}

fn parse_entries<T>(entries: Vec<Value>, label: &str, parse: fn(&Value) -> Option<T>) -> Vec<T> {
    let total = entries.len();
    let parsed: Vec<T> = entries.iter().filter_map(parse).collect();
    if parsed.len() < total {
        warn!("Dropped {} malformed {} entries", total - parsed.len(), label);
    }
    parsed
}

impl TrackerStorage for JsonTrackerRepository {
    fn load(&self) -> Result<StoredCollections> {
        let students = parse_entries(
            self.read_entries(&self.connection.students_path(), "students")?,
            "student",
            student_from_entry,
        );
        let lessons = parse_entries(
            self.read_entries(&self.connection.lessons_path(), "lessons")?,
            "lesson",
            lesson_from_entry,
        );
        info!(
            "Loaded {} students and {} lessons from {}",
            students.len(),
            lessons.len(),
            self.connection.base_directory().display()
        );
        Ok(StoredCollections { students, lessons })
    }

    fn save(&self, students: &[Student], lessons: &[Lesson]) -> Result<SaveOutcome> {
        let _guard = self
            .save_lock
            .lock()
            .map_err(|_| anyhow!("Tracker save lock poisoned"))?;

        let outcome = SaveOutcome {
            students_written: self.write_collection(&self.connection.students_path(), students, "students")?,
            lessons_written: self.write_collection(&self.connection.lessons_path(), lessons, "lessons")?,
        };
        Ok(outcome)
    }
}
