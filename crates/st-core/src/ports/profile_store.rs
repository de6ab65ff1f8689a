//! Profile store port
//!
//! Contract for the per-user document in the hosted document database.
//! Writes have merge semantics: unspecified fields are untouched.

use async_trait::async_trait;

use crate::auth::StoreError;
use crate::profile::{ProfileUpdate, UserProfile};

#[async_trait]
pub trait ProfileStorePort: Send + Sync {
    /// Read the profile document, `None` when it does not exist.
    async fn read_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Create the document for a first-time user.
    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), StoreError>;

    /// Merge-write the given fields; every write refreshes the server-side
    /// `updated_at` stamp.
    async fn write_partial(&self, uid: &str, update: &ProfileUpdate) -> Result<(), StoreError>;

    /// Set `completed_onboarding = true` and clear `onboarding_step`,
    /// atomically with a server-side timestamp update.
    async fn mark_onboarding_complete(&self, uid: &str) -> Result<(), StoreError>;
}
