// Secure token identity provider
//
// Email/password sign-in plus refresh-token grant against the Identity Toolkit
// and Secure Token REST endpoints.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use tokio::sync::RwLock;

use super::provider::IdentityProvider;
use super::types::{
    Credential, IdentityErrorBody, PasswordSignInRequest, PasswordSignInResponse, Principal,
    SecureTokenResponse, Session, TokenData,
};
use crate::error::IdentityError;

/// Default token lifetime when the provider omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Safety margin subtracted from the advertised lifetime
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Endpoints and key for the secure token provider
#[derive(Debug, Clone)]
pub struct SecureTokenEndpoints {
    /// Base URL of the identity toolkit API, e.g. `https://identitytoolkit.googleapis.com/v1`
    pub identity_url: String,
    /// Base URL of the secure token API, e.g. `https://securetoken.googleapis.com/v1`
    pub secure_token_url: String,
    /// Public web API key
    pub api_key: String,
}

impl SecureTokenEndpoints {
    fn sign_in_url(&self) -> String {
        format!(
            "{}/accounts:signInWithPassword",
            self.identity_url.trim_end_matches('/')
        )
    }

    fn refresh_url(&self) -> String {
        format!("{}/token", self.secure_token_url.trim_end_matches('/'))
    }

    /// The key travels as an encoded `key` query parameter
    fn key_query(&self) -> [(&'static str, &str); 1] {
        [("key", self.api_key.as_str())]
    }
}

/// Identity provider backed by the secure token REST API
pub struct SecureTokenProvider {
    client: Client,
    endpoints: SecureTokenEndpoints,
    email: String,
    password: String,
    token: RwLock<Option<TokenData>>,
}

impl SecureTokenProvider {
    pub fn new(
        client: Client,
        endpoints: SecureTokenEndpoints,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoints,
            email: email.into(),
            password: password.into(),
            token: RwLock::new(None),
        }
    }

    /// Exchange the stored refresh token for a new ID token
    async fn refresh(&self) -> Result<Credential, IdentityError> {
        let refresh_token = {
            let token = self.token.read().await;
            token
                .as_ref()
                .map(|t| t.refresh_token.clone())
                .ok_or(IdentityError::NotSignedIn)?
        };

        tracing::debug!("Refreshing ID token via secure token endpoint...");

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoints.refresh_url())
            .query(&self.endpoints.key_query())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = provider_message(&body);
            tracing::error!(status = status.as_u16(), message = %message, "Token refresh rejected");
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let data: SecureTokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;

        if data.id_token.is_empty() {
            return Err(IdentityError::MalformedResponse(
                "refresh response does not contain id_token".to_string(),
            ));
        }

        let expires_at = expires_at(data.expires_in.as_deref());
        let credential = Credential::new(data.id_token);

        let mut token = self.token.write().await;
        // Signed out while the refresh was in flight
        let Some(current) = token.as_mut() else {
            return Err(IdentityError::NotSignedIn);
        };
        current.id_token = credential.clone();
        current.expires_at = expires_at;
        if let Some(new_refresh_token) = data.refresh_token {
            current.refresh_token = new_refresh_token;
        }

        tracing::info!(
            "ID token refreshed, expires: {}",
            expires_at.to_rfc3339()
        );

        Ok(credential)
    }
}

#[async_trait]
impl IdentityProvider for SecureTokenProvider {
    fn name(&self) -> &str {
        "secure-token"
    }

    async fn sign_in(&self) -> Result<Session, IdentityError> {
        tracing::info!(email = %self.email, "Signing in with email and password...");

        let request = PasswordSignInRequest {
            email: &self.email,
            password: &self.password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(self.endpoints.sign_in_url())
            .query(&self.endpoints.key_query())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let data: PasswordSignInResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;

        if data.id_token.is_empty() {
            return Err(IdentityError::MalformedResponse(
                "sign-in response does not contain idToken".to_string(),
            ));
        }

        let credential = Credential::new(data.id_token);
        let expires_at = expires_at(data.expires_in.as_deref());

        *self.token.write().await = Some(TokenData {
            id_token: credential.clone(),
            refresh_token: data.refresh_token,
            expires_at,
        });

        Ok(Session {
            principal: Principal {
                uid: data.local_id,
                display_name: data.display_name.filter(|n| !n.is_empty()),
                email: data.email.or_else(|| Some(self.email.clone())),
            },
            credential,
        })
    }

    async fn get_credential(&self, force_refresh: bool) -> Result<Credential, IdentityError> {
        if !force_refresh {
            let token = self.token.read().await;
            match token.as_ref() {
                None => return Err(IdentityError::NotSignedIn),
                Some(t) if Utc::now() < t.expires_at => return Ok(t.id_token.clone()),
                Some(_) => {}
            }
        }
        self.refresh().await
    }

    async fn sign_out(&self) {
        *self.token.write().await = None;
    }
}

/// Compute the expiry instant from a provider `expires_in` string
fn expires_at(expires_in: Option<&str>) -> chrono::DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    Utc::now() + Duration::seconds((secs - EXPIRY_BUFFER_SECS).max(0))
}

/// Extract the provider's error message, falling back to the raw body
fn provider_message(body: &str) -> String {
    serde_json::from_str::<IdentityErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(server: &mockito::ServerGuard) -> SecureTokenEndpoints {
        SecureTokenEndpoints {
            identity_url: format!("{}/identity/v1", server.url()),
            secure_token_url: format!("{}/securetoken/v1/", server.url()),
            api_key: "test-key".to_string(),
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = SecureTokenEndpoints {
            identity_url: "https://id.example/v1/".to_string(),
            secure_token_url: "https://st.example/v1".to_string(),
            api_key: "k".to_string(),
        };
        assert_eq!(
            endpoints.sign_in_url(),
            "https://id.example/v1/accounts:signInWithPassword"
        );
        assert_eq!(endpoints.refresh_url(), "https://st.example/v1/token");
        assert_eq!(endpoints.key_query(), [("key", "k")]);
    }

    #[tokio::test]
    async fn test_api_key_is_query_encoded() {
        let mut server = mockito::Server::new_async().await;
        let sign_in = server
            .mock("POST", "/identity/v1/accounts:signInWithPassword")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "a&b=c d".into()))
            .with_status(200)
            .with_body(r#"{"localId":"uid-1","idToken":"tok1","refreshToken":"rt1"}"#)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/securetoken/v1/token")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "a&b=c d".into()))
            .with_status(200)
            .with_body(r#"{"id_token":"tok2","refresh_token":"rt2","expires_in":"3600"}"#)
            .expect(1)
            .create_async()
            .await;

        let mut endpoints = endpoints(&server);
        endpoints.api_key = "a&b=c d".to_string();
        let provider = SecureTokenProvider::new(Client::new(), endpoints, "a@b.c", "pw");

        provider.sign_in().await.unwrap();
        assert_eq!(provider.get_credential(true).await.unwrap().as_str(), "tok2");

        sign_in.assert_async().await;
        refresh.assert_async().await;
    }

    #[test]
    fn test_expires_at_applies_buffer() {
        let at = expires_at(Some("3600"));
        let remaining = (at - Utc::now()).num_seconds();
        assert!(remaining > 3500 && remaining <= 3540);

        // Unparseable values fall back to the default lifetime
        let at = expires_at(Some("soon"));
        assert!((at - Utc::now()).num_seconds() > 3500);
    }

    #[test]
    fn test_provider_message() {
        let body = r#"{"error":{"code":400,"message":"TOKEN_EXPIRED","errors":[]}}"#;
        assert_eq!(provider_message(body), "TOKEN_EXPIRED");
        assert_eq!(provider_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_get_credential_before_sign_in() {
        let server = mockito::Server::new_async().await;
        let provider =
            SecureTokenProvider::new(Client::new(), endpoints(&server), "a@b.c", "pw");
        assert!(matches!(
            provider.get_credential(false).await,
            Err(IdentityError::NotSignedIn)
        ));
        assert!(matches!(
            provider.get_credential(true).await,
            Err(IdentityError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_then_forced_refresh() {
        let mut server = mockito::Server::new_async().await;
        let sign_in = server
            .mock("POST", "/identity/v1/accounts:signInWithPassword")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"localId":"uid-1","email":"a@b.c","displayName":"Ada","idToken":"tok1","refreshToken":"rt1","expiresIn":"3600"}"#,
            )
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/securetoken/v1/token")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "rt1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id_token":"tok2","refresh_token":"rt2","expires_in":"3600","user_id":"uid-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let provider =
            SecureTokenProvider::new(Client::new(), endpoints(&server), "a@b.c", "pw");

        let session = provider.sign_in().await.unwrap();
        assert_eq!(session.principal.uid, "uid-1");
        assert_eq!(session.principal.display_name.as_deref(), Some("Ada"));
        assert_eq!(session.credential.as_str(), "tok1");

        // Cached token is served without a network call
        assert_eq!(provider.get_credential(false).await.unwrap().as_str(), "tok1");

        assert_eq!(provider.get_credential(true).await.unwrap().as_str(), "tok2");
        assert_eq!(provider.get_credential(false).await.unwrap().as_str(), "tok2");

        sign_in.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_refresh_reports_provider_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/v1/accounts:signInWithPassword")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"localId":"uid-1","idToken":"tok1","refreshToken":"rt1"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/securetoken/v1/token")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"TOKEN_EXPIRED"}}"#)
            .create_async()
            .await;

        let provider =
            SecureTokenProvider::new(Client::new(), endpoints(&server), "a@b.c", "pw");
        provider.sign_in().await.unwrap();

        match provider.get_credential(true).await {
            Err(IdentityError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "TOKEN_EXPIRED");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_sign_in() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/v1/accounts:signInWithPassword")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"INVALID_PASSWORD"}}"#)
            .create_async()
            .await;

        let provider =
            SecureTokenProvider::new(Client::new(), endpoints(&server), "a@b.c", "wrong");
        let err = provider.sign_in().await.unwrap_err();
        assert!(err.to_string().contains("INVALID_PASSWORD"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/v1/accounts:signInWithPassword")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"localId":"uid-1","idToken":"tok1","refreshToken":"rt1"}"#)
            .create_async()
            .await;

        let provider =
            SecureTokenProvider::new(Client::new(), endpoints(&server), "a@b.c", "pw");
        provider.sign_in().await.unwrap();
        provider.sign_out().await;
        assert!(matches!(
            provider.get_credential(false).await,
            Err(IdentityError::NotSignedIn)
        ));
    }
}
