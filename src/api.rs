// Typed wellness API
// Endpoint wrappers over the authenticated client with envelope decoding

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::http_client::{AuthenticatedClient, RequestOptions};
use crate::models::{
    ApiEnvelope, BadgesSummary, ChatReply, ChatRequest, ChatSuggestions, DailyPlan, JournalCreated,
    JournalPage, JournalRequest, MeditationLibrary, MoodLogCreated, MoodLogRequest, MoodLogsPage,
    SignupRequest, TaskUpdate, UserProfile, UserStats,
};

/// Typed client for the wellness backend.
///
/// Every call requires a signed-in session and decodes the `{success, data, message}`
/// envelope into its model.
#[derive(Clone)]
pub struct WellnessApi {
    client: AuthenticatedClient,
}

impl WellnessApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    // === Profile ===

    pub async fn create_profile(&self, uid: &str, email: &str, name: &str) -> Result<UserProfile> {
        let request = SignupRequest {
            uid: uid.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        self.post("/api/auth/signup", &request).await
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.get("/api/auth/profile").await
    }

    // === Gamification ===

    pub async fn gamification_stats(&self) -> Result<UserStats> {
        self.get("/api/gamification/stats").await
    }

    pub async fn badges(&self) -> Result<BadgesSummary> {
        self.get("/api/gamification/badges").await
    }

    // === Planner ===

    pub async fn daily_plan(&self) -> Result<DailyPlan> {
        self.get("/api/planner/today").await
    }

    pub async fn complete_task(&self, task_id: &str) -> Result<TaskUpdate> {
        let path = format!("/api/planner/task/{}/complete", validate_task_id(task_id)?);
        self.post(&path, &Value::Object(Default::default())).await
    }

    pub async fn skip_task(&self, task_id: &str) -> Result<TaskUpdate> {
        let path = format!("/api/planner/task/{}/skip", validate_task_id(task_id)?);
        self.post(&path, &Value::Object(Default::default())).await
    }

    // === Progress ===

    pub async fn mood_logs(&self, limit: u32) -> Result<MoodLogsPage> {
        let path = format!("/api/progress/mood-logs?limit={}", validate_limit(limit)?);
        self.get(&path).await
    }

    pub async fn log_mood(&self, request: &MoodLogRequest) -> Result<MoodLogCreated> {
        request.validate()?;
        self.post("/api/progress/mood-logs", request).await
    }

    // === Journal ===

    pub async fn journal_entries(&self, limit: u32) -> Result<JournalPage> {
        let path = format!("/api/journal/?limit={}", validate_limit(limit)?);
        self.get(&path).await
    }

    pub async fn create_journal_entry(&self, text: &str) -> Result<JournalCreated> {
        let request = JournalRequest::new(text)?;
        self.post("/api/journal/", &request).await
    }

    // === Chat ===

    pub async fn send_chat(
        &self,
        message: &str,
        conversation_id: Option<String>,
    ) -> Result<ChatReply> {
        let request = ChatRequest::new(message, conversation_id)?;
        self.post("/api/chat/", &request).await
    }

    pub async fn chat_suggestions(&self) -> Result<ChatSuggestions> {
        self.get("/api/chat/suggestions").await
    }

    // === Meditations ===

    pub async fn meditations(&self) -> Result<MeditationLibrary> {
        self.get("/api/meditations/").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(path, RequestOptions::get()).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.call(path, RequestOptions::post().json(body)?).await
    }

    async fn call<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        let response = self.client.request_authenticated(path, options).await?;
        let status = response.status();
        let body = response.text().await?;

        decode_envelope(status, &body).inspect_err(|e| {
            tracing::warn!(path = %path, status = %status, error = %e, "API call failed");
        })
    }
}

/// Decode a backend response body.
///
/// - non-2xx: `Upstream` with the envelope message, else the raw body
/// - `success: false`: `Upstream` with the envelope message
/// - body or `data` not matching `T`: `MalformedResponse`
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let envelope = serde_json::from_str::<ApiEnvelope<Value>>(body);

    if !status.is_success() {
        let message = envelope
            .ok()
            .and_then(|env| env.message)
            .unwrap_or_else(|| body.to_string());
        return Err(ClientError::upstream(status.as_u16(), &message));
    }

    let envelope = envelope
        .map_err(|e| ClientError::MalformedResponse(format!("invalid response envelope: {}", e)))?;

    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(ClientError::upstream(status.as_u16(), &message));
    }

    let data = envelope
        .data
        .ok_or_else(|| ClientError::MalformedResponse("response has no data".to_string()))?;

    serde_json::from_value(data).map_err(|e| {
        ClientError::MalformedResponse(format!(
            "unexpected {} payload: {}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("response"),
            e
        ))
    })
}

/// Task ids are interpolated into the path
fn validate_task_id(task_id: &str) -> Result<&str> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(ClientError::InvalidRequest("task id cannot be empty".to_string()));
    }
    if !task_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ClientError::InvalidRequest(format!(
            "invalid task id: {}",
            task_id
        )));
    }
    Ok(task_id)
}

fn validate_limit(limit: u32) -> Result<u32> {
    if limit == 0 {
        return Err(ClientError::InvalidRequest(
            "limit must be greater than zero".to_string(),
        ));
    }
    Ok(limit)
}
