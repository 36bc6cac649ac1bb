use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Upper bound for energy and stress levels
pub const MAX_LEVEL: u8 = 10;

/// Maximum length of a mood note
pub const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
    Stressed,
    Anxious,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::Stressed,
        Mood::Anxious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Stressed => "stressed",
            Mood::Anxious => "anxious",
        }
    }

    /// Chart score on a 1-10 scale
    pub fn score(&self) -> u8 {
        match self {
            Mood::Happy => 9,
            Mood::Neutral => 5,
            Mood::Stressed => 3,
            Mood::Anxious => 2,
            Mood::Sad => 1,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!(
                    "invalid mood '{}', must be one of: happy, neutral, sad, stressed, anxious",
                    s
                ))
            })
    }
}

/// Body of `POST /api/progress/mood-logs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodLogRequest {
    pub mood: Mood,
    pub energy: u8,
    pub stress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MoodLogRequest {
    pub fn new(mood: Mood, energy: u8, stress: u8) -> Self {
        Self {
            mood,
            energy,
            stress,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = Some(note).filter(|n| !n.trim().is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.energy > MAX_LEVEL {
            return Err(ClientError::InvalidRequest(format!(
                "energy must be between 0 and {}",
                MAX_LEVEL
            )));
        }
        if self.stress > MAX_LEVEL {
            return Err(ClientError::InvalidRequest(format!(
                "stress must be between 0 and {}",
                MAX_LEVEL
            )));
        }
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_CHARS {
                return Err(ClientError::InvalidRequest(format!(
                    "note must be at most {} characters",
                    MAX_NOTE_CHARS
                )));
            }
        }
        Ok(())
    }
}

/// Data returned after logging a mood
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodLogCreated {
    pub log_id: String,
    pub mood: Mood,
    pub energy: u8,
    pub stress: u8,
    pub points_earned: u32,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodLog {
    pub id: Option<String>,
    pub mood: Mood,
    pub energy: u8,
    pub stress: u8,
    #[serde(default)]
    pub note: String,
    pub timestamp: String,
}

impl MoodLog {
    /// Timestamp parsed as RFC 3339, if the backend sent an offset
    pub fn logged_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodLogsPage {
    pub logs: Vec<MoodLog>,
    #[serde(default)]
    pub total: usize,
}

impl MoodLogsPage {
    /// Average chart score over the page, `None` when empty
    pub fn average_score(&self) -> Option<f64> {
        if self.logs.is_empty() {
            return None;
        }
        let total: u32 = self.logs.iter().map(|l| u32::from(l.mood.score())).sum();
        Some(f64::from(total) / self.logs.len() as f64)
    }
}
