//! Domain model representing a student on the tutor's roster.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Palette students are coloured from, assigned round-robin at creation
pub const VIBRANT_COLORS: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#F7B801", "#F9A620", "#5EAAA8",
    "#A2D5F2", "#FF8C42", "#E26D5C", "#726DA8", "#20A39E", "#F45B69",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub color: String,
    pub balance: f64,
    pub is_archived: bool,
    pub archived_date: Option<DateTime<Utc>>,
}

impl Student {
    /// Generate a unique ID for a student
    pub fn generate_id() -> String {
        format!("student::{}", Uuid::new_v4())
    }

    /// Create a new student with zero balance, coloured by roster position
    pub fn new(name: &str, roster_size: usize) -> Self {
        Self {
            id: Self::generate_id(),
            name: name.trim().to_string(),
            color: Self::color_for_index(roster_size).to_string(),
            balance: 0.0,
            is_archived: false,
            archived_date: None,
        }
    }

    pub fn color_for_index(index: usize) -> &'static str {
        VIBRANT_COLORS[index % VIBRANT_COLORS.len()]
    }

    /// Case-insensitive name match, ignoring surrounding whitespace
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Check a colour is a `#RRGGBB` hex string
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}
