use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use super::provider::IdentityProvider;
use super::types::{ChangeReason, Credential, Principal, Session, SessionChanged, SessionState};
use crate::error::ClientError;

/// Capacity of the session-changed channel; slow subscribers see `Lagged`
const SESSION_EVENT_CAPACITY: usize = 16;

/// Session manager
/// Owns the session state machine and publishes session-changed notifications
pub struct SessionManager {
    /// Identity provider used for sign-in and refresh
    provider: Arc<dyn IdentityProvider>,

    /// Current session state, swapped atomically under the lock
    state: RwLock<SessionState>,

    /// Serializes sign-in, sign-out and expiry, provider calls included
    lifecycle: Mutex<()>,

    /// Held across a refresh when refreshes are coalesced
    refresh_flight: Mutex<()>,

    /// Session-changed notifications
    events: broadcast::Sender<SessionChanged>,

    /// Let concurrent 401s share one refresh
    coalesce_refresh: bool,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, coalesce_refresh: bool) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            provider,
            state: RwLock::new(SessionState::Anonymous),
            lifecycle: Mutex::new(()),
            refresh_flight: Mutex::new(()),
            events,
            coalesce_refresh,
        }
    }

    /// Sign in through the provider and start a session
    pub async fn sign_in(&self) -> Result<Principal, ClientError> {
        let _lifecycle = self.lifecycle.lock().await;
        tracing::debug!(provider = self.provider.name(), "Signing in...");

        let session = self.provider.sign_in().await?;
        let principal = session.principal.clone();

        tracing::info!(
            uid = %principal.uid,
            "Signed in (token: {}...)",
            session.credential.preview()
        );

        *self.state.write().await = SessionState::Authenticated(session);
        self.notify(Some(principal.clone()), ChangeReason::SignedIn);

        Ok(principal)
    }

    /// End the session. Observers are notified only if a session existed.
    pub async fn sign_out(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, SessionState::Anonymous)
        };
        self.provider.sign_out().await;

        if previous.session().is_some() {
            tracing::info!("Signed out");
            self.notify(None, ChangeReason::SignedOut);
        }
    }

    /// Latest known credential, if a session exists
    pub async fn credential(&self) -> Option<Credential> {
        let state = self.state.read().await;
        state.session().map(|s| s.credential.clone())
    }

    pub async fn principal(&self) -> Option<Principal> {
        let state = self.state.read().await;
        state.session().map(|s| s.principal.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session().is_some()
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Subscribe to session-changed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChanged> {
        self.events.subscribe()
    }

    /// Handle a 401 by forcing exactly one credential refresh.
    ///
    /// Returns `Ok(None)` when there is no session to refresh (the 401 is then the
    /// caller's to interpret), `Ok(Some(credential))` with the fresh credential, or
    /// `AuthenticationFailed` after terminating the session.
    ///
    /// With coalescing, a caller arriving while a refresh is in flight waits for it
    /// and reuses its credential instead of refreshing again.
    pub async fn refresh_after_unauthorized(
        &self,
        rejected: Option<&Credential>,
    ) -> Result<Option<Credential>, ClientError> {
        let _flight = if self.coalesce_refresh {
            Some(self.refresh_flight.lock().await)
        } else {
            None
        };

        {
            let mut state = self.state.write().await;
            let Some(session) = state.session().cloned() else {
                return Ok(None);
            };

            if self.coalesce_refresh {
                if let Some(rejected) = rejected {
                    if session.credential != *rejected {
                        tracing::debug!(
                            "Credential already refreshed by a concurrent request, reusing it"
                        );
                        return Ok(Some(session.credential));
                    }
                }
            }

            *state = SessionState::Refreshing(session);
        }

        tracing::warn!("Received 401, forcing credential refresh...");

        match self.provider.get_credential(true).await {
            Ok(credential) => {
                let mut state = self.state.write().await;
                let Some(session) = state.session().cloned() else {
                    // Signed out while the refresh was in flight
                    tracing::debug!("Session ended during refresh, discarding new credential");
                    return Ok(None);
                };
                tracing::info!(
                    "Credential refreshed (token: {}...)",
                    credential.preview()
                );
                *state = SessionState::Authenticated(Session {
                    principal: session.principal,
                    credential: credential.clone(),
                });
                Ok(Some(credential))
            }
            Err(e) => {
                tracing::error!("Credential refresh failed: {}", e);
                self.expire().await;
                Err(ClientError::AuthenticationFailed(format!(
                    "credential refresh failed: {}",
                    e
                )))
            }
        }
    }

    /// Terminate the session after an irrecoverable refresh failure
    async fn expire(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        {
            let mut state = self.state.write().await;
            if state.session().is_none() {
                // A concurrent request already terminated the session
                return;
            }
            *state = SessionState::Expired;
        }

        self.provider.sign_out().await;

        {
            let mut state = self.state.write().await;
            if matches!(*state, SessionState::Expired) {
                *state = SessionState::Anonymous;
            }
        }
        tracing::warn!("Session expired, signed out");
        self.notify(None, ChangeReason::Expired);
    }

    fn notify(&self, principal: Option<Principal>, reason: ChangeReason) {
        // No subscribers is not an error
        let _ = self.events.send(SessionChanged { principal, reason });
    }
}
