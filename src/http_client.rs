use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::auth::{Credential, IdentityProvider, SessionChanged, SessionManager};
use crate::config::Config;
use crate::error::ClientError;

/// Body of an outbound request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Already serialized payload, sent verbatim
    Raw(String),
    /// JSON value, serialized at send time
    Json(serde_json::Value),
}

/// Per-call options: method, extra headers and body
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the defaults; caller values win
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self::method(Method::POST)
    }

    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("body is not serializable: {}", e)))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }
}

/// HTTP client for the wellness API.
///
/// Attaches the current credential to every call and, on a 401 while signed in,
/// forces one credential refresh and reissues the request exactly once.
/// Clone is cheap: the connection pool and session are shared.
#[derive(Clone)]
pub struct AuthenticatedClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Session state and refresh
    session: Arc<SessionManager>,

    /// Base for relative request paths
    base_url: Url,
}

impl AuthenticatedClient {
    /// Create a new client around an existing session manager
    pub fn new(
        session: Arc<SessionManager>,
        base_url: &str,
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()?;

        Ok(Self {
            client,
            session,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Build the client context from configuration and an identity provider
    pub fn init(config: &Config, provider: Arc<dyn IdentityProvider>) -> Result<Self, ClientError> {
        let session = Arc::new(SessionManager::new(provider, config.coalesce_refresh));
        let client = Self::new(
            session,
            &config.api_base_url,
            config.http_max_connections,
            config.http_connect_timeout,
            config.http_request_timeout,
        )?;
        tracing::debug!(base_url = %client.base_url, "HTTP client initialized");
        Ok(client)
    }

    /// Sign out and release the session
    pub async fn dispose(self) {
        self.session.sign_out().await;
        tracing::debug!("HTTP client disposed");
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Subscribe to session-changed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChanged> {
        self.session.subscribe()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform a request, attaching the current credential when one is held.
    ///
    /// Any status is returned as a normal response. Only a 401 while signed in is
    /// acted upon: one forced refresh, then one reissue whose result is returned as is.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<Response, ClientError> {
        let url = self.resolve_url(url)?;

        tracing::debug!(
            method = %options.method,
            url = %url,
            "Sending HTTP request"
        );

        let credential = self.session.credential().await;
        let response = self.send(&url, &options, credential.as_ref(), 1).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        match self
            .session
            .refresh_after_unauthorized(credential.as_ref())
            .await?
        {
            Some(fresh) => {
                tracing::debug!(url = %url, "Reissuing request with refreshed credential");
                self.send(&url, &options, Some(&fresh), 2).await
            }
            None => {
                tracing::debug!(url = %url, "Received 401 without a session, returning as is");
                Ok(response)
            }
        }
    }

    /// Like [`request`](Self::request), but fails with `NotAuthenticated` when signed out
    pub async fn request_authenticated(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        if !self.session.is_authenticated().await {
            return Err(ClientError::NotAuthenticated);
        }
        self.request(url, options).await
    }

    /// Execute a single attempt
    async fn send(
        &self,
        url: &Url,
        options: &RequestOptions,
        credential: Option<&Credential>,
        attempt: u32,
    ) -> Result<Response, ClientError> {
        let headers = build_headers(credential, &options.headers)?;

        let mut builder = self
            .client
            .request(options.method.clone(), url.clone())
            .headers(headers);

        match &options.body {
            Some(RequestBody::Raw(body)) => builder = builder.body(body.clone()),
            Some(RequestBody::Json(value)) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    ClientError::InvalidRequest(format!("body is not serializable: {}", e))
                })?;
                builder = builder.body(bytes);
            }
            None => {}
        }

        match builder.send().await {
            Ok(response) => {
                tracing::debug!(
                    status = %response.status(),
                    attempt = attempt,
                    "Received HTTP response"
                );
                Ok(response)
            }
            Err(e) => {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else if e.is_body() {
                    "body_error"
                } else {
                    "unknown"
                };

                tracing::warn!(
                    error_kind = error_kind,
                    error = %e,
                    url = %url,
                    attempt = attempt,
                    "HTTP request error"
                );
                Err(ClientError::Network(e))
            }
        }
    }

    /// Resolve an absolute URL or a path relative to the base URL
    fn resolve_url(&self, url: &str) -> Result<Url, ClientError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        // Leading slash is relative to the base path, not the host root
        self.base_url
            .join(url.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid URL {}: {}", url, e)))
    }
}

/// Parse the API base URL, making sure joins keep its path
fn parse_base_url(base_url: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(base_url).map_err(|e| {
        ClientError::InvalidRequest(format!("invalid base URL {}: {}", base_url, e))
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Default headers, then the bearer credential, then caller headers (caller wins).
/// Header names are case-insensitive.
pub fn build_headers(
    credential: Option<&Credential>,
    caller: &HashMap<String, String>,
) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(credential) = credential {
        let value = HeaderValue::from_str(&credential.bearer())
            .map_err(|_| ClientError::InvalidRequest("credential is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in caller {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidRequest(format!("invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ClientError::InvalidRequest(format!("invalid value for header {}", name))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}
