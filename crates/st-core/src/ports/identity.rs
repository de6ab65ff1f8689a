//! Identity gateway port
//!
//! Wraps the external authentication provider: email/password and federated
//! sign-in, sign-out, password reset, and the session-change stream.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::auth::{AuthError, AuthenticatedIdentity, FederatedProvider, SessionChange};
use crate::auth::ProviderIdentity;

#[async_trait]
pub trait IdentityGatewayPort: Send + Sync {
    async fn sign_in_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, AuthError>;

    async fn sign_up_email(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError>;

    async fn sign_in_federated(
        &self,
        provider: FederatedProvider,
    ) -> Result<AuthenticatedIdentity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Sends a password-reset email through the provider.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Identity of the currently signed-in user, if any.
    async fn current_identity(&self) -> Option<ProviderIdentity>;

    /// Current session token, if signed in.
    async fn id_token(&self) -> Option<String>;

    /// Subscribe to session transitions (sign-in, sign-out, token refresh).
    /// The current session is emitted immediately on subscribe; dropping the
    /// receiver unsubscribes.
    async fn subscribe_sessions(&self) -> mpsc::Receiver<SessionChange>;
}
