//! Auth cache port
//!
//! Persists the whitelisted auth slice across process restarts. Read once at
//! startup before first render, written after every coordinator state change.

use async_trait::async_trait;

use crate::auth::PersistedAuthState;

#[async_trait]
pub trait AuthCachePort: Send + Sync {
    /// Load the persisted slice, `None` when nothing was saved yet.
    async fn load(&self) -> anyhow::Result<Option<PersistedAuthState>>;

    async fn save(&self, state: &PersistedAuthState) -> anyhow::Result<()>;

    /// Remove the persisted slice (sign-out).
    async fn clear(&self) -> anyhow::Result<()>;
}
