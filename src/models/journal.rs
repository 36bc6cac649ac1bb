use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const MIN_ENTRY_CHARS: usize = 10;
pub const MAX_ENTRY_CHARS: usize = 2000;

/// Characters shown in an entry preview
const PREVIEW_CHARS: usize = 100;

/// Body of `POST /api/journal/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalRequest {
    pub text: String,
}

impl JournalRequest {
    /// Trimmed entry, rejected when shorter than 10 or longer than 2000 characters
    pub fn new(text: &str) -> Result<Self, ClientError> {
        let text = text.trim();
        let chars = text.chars().count();
        if chars == 0 {
            return Err(ClientError::InvalidRequest(
                "journal entry cannot be empty".to_string(),
            ));
        }
        if chars < MIN_ENTRY_CHARS {
            return Err(ClientError::InvalidRequest(format!(
                "journal entry must be at least {} characters long",
                MIN_ENTRY_CHARS
            )));
        }
        if chars > MAX_ENTRY_CHARS {
            return Err(ClientError::InvalidRequest(format!(
                "journal entry must be at most {} characters long",
                MAX_ENTRY_CHARS
            )));
        }
        Ok(Self {
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    pub duration_min: Option<u32>,
    pub resource_url: Option<String>,
}

/// AI analysis attached to a journal entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalInsight {
    pub mood: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    pub risk: Option<String>,
    pub message: Option<String>,
    pub escalation_advice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub word_count: u32,
    pub timestamp: String,
    #[serde(default)]
    pub ai_insight: JournalInsight,
    #[serde(default = "default_mood")]
    pub mood: String,
}

fn default_mood() -> String {
    "neutral".to_string()
}

impl JournalEntry {
    /// First 100 characters, with an ellipsis when cut
    pub fn preview(&self) -> String {
        if self.text.chars().count() <= PREVIEW_CHARS {
            return self.text.clone();
        }
        let cut: String = self.text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalPage {
    pub entries: Vec<JournalEntry>,
    #[serde(default)]
    pub total: usize,
}

/// Data returned after writing an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalCreated {
    pub entry_id: String,
    #[serde(default)]
    pub insight: Option<JournalInsight>,
    #[serde(default)]
    pub points_earned: u32,
}
