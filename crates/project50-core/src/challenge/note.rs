//! Per-day journal notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the day felt. Five fixed values, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Low,
    Awful,
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "great" => Ok(Mood::Great),
            "good" => Ok(Mood::Good),
            "okay" | "ok" => Ok(Mood::Okay),
            "low" => Ok(Mood::Low),
            "awful" => Ok(Mood::Awful),
            other => Err(format!("unknown mood: {other}")),
        }
    }
}

/// A free-text entry attached to one challenge day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayNote {
    pub id: String,
    pub day_number: u32,
    pub content: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DayNote {
    pub fn new(day_number: u32, content: impl Into<String>, mood: Option<Mood>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            day_number,
            content: content.into(),
            mood,
            created_at: at,
            updated_at: at,
        }
    }

    /// Replace content and mood, keeping identity and creation time.
    pub fn rewrite(&mut self, content: impl Into<String>, mood: Option<Mood>, at: DateTime<Utc>) {
        self.content = content.into();
        self.mood = mood;
        self.updated_at = at;
    }
}
