// Identity provider seam

use async_trait::async_trait;

use super::types::{Credential, Session};
use crate::error::IdentityError;

/// Source of sessions and credentials.
///
/// The client never issues credentials itself; it asks a provider to sign in,
/// to hand out the current credential, or to force-refresh it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Sign in and return the new session
    async fn sign_in(&self) -> Result<Session, IdentityError>;

    /// Current credential. `force_refresh` bypasses any cached token.
    async fn get_credential(&self, force_refresh: bool) -> Result<Credential, IdentityError>;

    /// Drop any provider-side state for the signed-in user
    async fn sign_out(&self);
}
