// Error handling module
// Defines the client and identity provider error types

use thiserror::Error;

/// Maximum length for upstream response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors surfaced by the authenticated client and the typed API layer
#[derive(Error, Debug)]
pub enum ClientError {
    /// An authenticated operation was attempted with no active session
    #[error("Not authenticated: sign in first")]
    NotAuthenticated,

    /// Credential refresh failed after a 401; the session has been terminated
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transport failure, no response received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response (or an envelope with success=false) seen by the typed API layer
    #[error("Upstream error: {status} - {message}")]
    Upstream { status: u16, message: String },

    /// Response body did not match the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request could not be built (bad URL, header, body or argument)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Sign-in through the identity provider failed
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),
}

impl ClientError {
    /// Build an upstream error from a status and raw body, truncating long bodies
    pub fn upstream(status: u16, body: &str) -> Self {
        ClientError::Upstream {
            status,
            message: truncate_body(body),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Upstream { status, .. } => Some(*status),
            ClientError::Identity(IdentityError::Rejected { status, .. }) => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the error ended (or requires) the session
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::AuthenticationFailed(_)
        )
    }
}

/// Errors reported by an identity provider
#[derive(Error, Debug)]
pub enum IdentityError {
    /// No signed-in user to issue a credential for
    #[error("No user is signed in")]
    NotSignedIn,

    /// The provider answered with a non-success status
    #[error("Identity provider rejected the request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached
    #[error("Identity provider unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a body we could not interpret
    #[error("Identity provider returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Truncate a response body to avoid carrying excessive data in errors
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... (truncated, {} total bytes)",
        &body[..end],
        body.len()
    )
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClientError::NotAuthenticated;
        assert_eq!(err.to_string(), "Not authenticated: sign in first");

        let err = ClientError::AuthenticationFailed("refresh rejected".to_string());
        assert_eq!(err.to_string(), "Authentication failed: refresh rejected");

        let err = ClientError::Upstream {
            status: 404,
            message: "Task not found".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream error: 404 - Task not found");
    }

    #[test]
    fn test_malformed_response_message() {
        let err = ClientError::MalformedResponse("missing field `tasks`".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed response: missing field `tasks`"
        );
    }

    #[test]
    fn test_identity_error_wraps_into_client_error() {
        let err: ClientError = IdentityError::Rejected {
            status: 400,
            message: "INVALID_PASSWORD".to_string(),
        }
        .into();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("INVALID_PASSWORD"));
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ClientError::upstream(503, "down").status(), Some(503));
        assert_eq!(ClientError::NotAuthenticated.status(), None);
        assert_eq!(
            ClientError::MalformedResponse("x".to_string()).status(),
            None
        );
    }

    #[test]
    fn test_is_auth_error() {
        assert!(ClientError::NotAuthenticated.is_auth_error());
        assert!(ClientError::AuthenticationFailed("x".to_string()).is_auth_error());
        assert!(!ClientError::upstream(401, "").is_auth_error());
    }

    #[test]
    fn test_upstream_truncates_long_body() {
        let body = "x".repeat(2000);
        match ClientError::upstream(500, &body) {
            ClientError::Upstream { message, .. } => {
                assert!(message.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
                assert!(message.ends_with("(truncated, 2000 total bytes)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 3-byte characters straddle the cut point
        let body = "€".repeat(400);
        let truncated = truncate_body(&body);
        assert!(truncated.contains("truncated, 1200 total bytes"));
    }

    #[test]
    fn test_short_body_kept_verbatim() {
        assert_eq!(truncate_body("Task not found"), "Task not found");
    }
}
