use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Body of `POST /api/chat/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: &str, conversation_id: Option<String>) -> Result<Self, ClientError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ClientError::InvalidRequest(
                "chat message cannot be empty".to_string(),
            ));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ClientError::InvalidRequest(format!(
                "chat message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(Self {
            message: message.to_string(),
            conversation_id,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub response: String,
    #[serde(default)]
    pub mood_detected: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub points_earned: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionContext {
    pub recent_mood: Option<String>,
    #[serde(default)]
    pub recent_categories: Vec<String>,
}

/// `GET /api/chat/suggestions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSuggestions {
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub context: SuggestionContext,
}
