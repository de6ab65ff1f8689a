//! Platform seam for federated sign-in.
//!
//! The popup/browser interaction is owned by the embedding platform; the
//! gateway only exchanges the credential it produces. Implementations report
//! a dismissed popup as `AuthError::Cancelled`, a blocked one as
//! `PopupBlocked`, and an overlapping request as `ConcurrentPopupRequest`.

use async_trait::async_trait;

use st_core::auth::AuthError;
use st_core::FederatedProvider;

/// OAuth credential produced by the platform popup flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    /// The provider's ID token, exchanged with the identity gateway.
    pub id_token: String,
}

#[async_trait]
pub trait FederatedFlowPort: Send + Sync {
    async fn acquire_credential(
        &self,
        provider: FederatedProvider,
    ) -> Result<FederatedCredential, AuthError>;
}
