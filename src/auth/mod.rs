// Authentication module
// Session lifecycle, identity provider seam and the secure token provider

mod manager;
mod provider;
mod refresh;
mod types;

pub use manager::SessionManager;
pub use provider::IdentityProvider;
pub use refresh::{SecureTokenEndpoints, SecureTokenProvider};
pub use types::{ChangeReason, Credential, Principal, Session, SessionChanged, SessionState};
