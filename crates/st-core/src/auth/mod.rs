//! Authentication session domain models
//!
//! The coordinator state, the whitelisted persisted slice, and the identity
//! types shared between the identity gateway and the application layer.

mod error;

pub use error::{AuthError, StoreError, ValidationError};

use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;

/// Federated sign-in providers supported by the identity gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FederatedProvider {
    Google,
    Apple,
}

impl FederatedProvider {
    /// Provider id as understood by the identity gateway.
    pub fn provider_id(&self) -> &'static str {
        match self {
            FederatedProvider::Google => "google.com",
            FederatedProvider::Apple => "apple.com",
        }
    }
}

/// What the identity provider knows about a user, independent of the
/// profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// A successful sign-in or sign-up result: identity plus session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub identity: ProviderIdentity,
    pub token: String,
}

/// One emission of the identity gateway's session stream: `None` on
/// sign-out, `Some` on sign-in and token refresh.
pub type SessionChange = Option<ProviderIdentity>;

/// Coordinator state. Mutated only by the auth coordinator; everything else
/// reads it through a watch subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// Reset to the signed-out state, clearing any error.
    pub fn reset_signed_out(&mut self) {
        self.user = None;
        self.token = None;
        self.is_loading = false;
        self.is_authenticated = false;
        self.error = None;
    }

    /// True once any auth state is known, persisted or fresh. Used to keep
    /// background session refreshes from flashing a loading screen.
    pub fn has_known_session(&self) -> bool {
        self.user.is_some() || self.is_authenticated
    }
}

/// The whitelisted subset of coordinator state persisted across restarts.
///
/// Stale-tolerant: rehydrated before first render as an optimistic snapshot
/// while the background session refresh runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedAuthState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl PersistedAuthState {
    pub fn snapshot(state: &AuthState) -> Self {
        Self {
            user: state.user.clone(),
            token: state.token.clone(),
            is_authenticated: state.is_authenticated,
        }
    }

    /// Rehydrate the whitelisted fields into a live state. Loading and error
    /// flags are transient and never persisted.
    pub fn apply_to(&self, state: &mut AuthState) {
        state.user = self.user.clone();
        state.token = self.token.clone();
        state.is_authenticated = self.is_authenticated;
    }
}
