// Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of token characters shown in logs and debug output
const TOKEN_PREVIEW_CHARS: usize = 8;

/// Opaque bearer token issued by the identity provider.
/// Debug output only ever shows a short prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Short prefix safe to put in logs
    pub fn preview(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(TOKEN_PREVIEW_CHARS)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({}...)", self.preview())
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Principal {
    /// Name to greet the user with: display name, then the email's local part, then "User"
    pub fn greeting_name(&self) -> &str {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name;
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
    }
}

/// A principal together with its current credential
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub principal: Principal,
    pub credential: Credential,
}

/// Session lifecycle
///
/// `Anonymous -> Authenticated -> Refreshing -> Authenticated | Expired -> Anonymous`
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Session),
    /// A forced refresh is in flight; the old credential is still the latest known one
    Refreshing(Session),
    /// Refresh failed; identity is being cleared
    Expired,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(s) | SessionState::Refreshing(s) => Some(s),
            SessionState::Anonymous | SessionState::Expired => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Refreshing(_) => "refreshing",
            SessionState::Expired => "expired",
        }
    }
}

/// Why the session changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    SignedIn,
    SignedOut,
    /// Forced sign-out after a failed credential refresh
    Expired,
}

/// Session-changed notification. `principal` is `None` once signed out.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChanged {
    pub principal: Option<Principal>,
    pub reason: ChangeReason,
}

/// Token data held by the secure token provider
#[derive(Debug, Clone)]
pub struct TokenData {
    pub id_token: Credential,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Email/password sign-in request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// Email/password sign-in response
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSignInResponse {
    pub id_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds, sent as a string
    pub expires_in: Option<String>,
    pub local_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Refresh-token grant response
#[derive(Deserialize)]
pub struct SecureTokenResponse {
    pub id_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<String>,
    pub user_id: Option<String>,
}

/// Error body returned by the identity endpoints
#[derive(Deserialize)]
pub struct IdentityErrorBody {
    pub error: IdentityErrorDetail,
}

#[derive(Deserialize)]
pub struct IdentityErrorDetail {
    #[serde(default)]
    pub message: String,
}
