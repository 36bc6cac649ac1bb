use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::Principal;

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupRequest {
    pub uid: String,
    pub email: String,
    pub name: String,
}

impl SignupRequest {
    /// Profile for a freshly signed-in principal; `None` without an email
    pub fn from_principal(principal: &Principal) -> Option<Self> {
        Some(Self {
            uid: principal.uid.clone(),
            email: principal.email.clone()?,
            name: principal.display_name.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub preferences: Map<String, Value>,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_from_principal() {
        let principal = Principal {
            uid: "uid-1".to_string(),
            display_name: None,
            email: Some("ada@example.com".to_string()),
        };
        let req = SignupRequest::from_principal(&principal).unwrap();
        assert_eq!(req.name, "");
        assert_eq!(req.email, "ada@example.com");

        let anonymous_email = Principal {
            email: None,
            ..principal
        };
        assert!(SignupRequest::from_principal(&anonymous_email).is_none());
    }

    #[test]
    fn test_parse_profile() {
        let json = r#"{"uid": "uid-1", "email": "ada@example.com", "name": "Ada",
                       "onboarding_completed": false,
                       "preferences": {"notifications": true, "daily_reminders": true}}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.preferences["notifications"], true);
        assert!(profile.created_at.is_none());
    }
}
