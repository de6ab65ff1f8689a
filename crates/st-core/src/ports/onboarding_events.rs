//! Onboarding event port
//!
//! The UI shell implements this to receive wizard transitions and completion
//! animation ticks.

use async_trait::async_trait;

use crate::onboarding::WizardState;

#[async_trait]
pub trait OnboardingEventPort: Send + Sync {
    /// Emitted on every wizard state transition.
    async fn wizard_state_changed(&self, state: WizardState);

    /// Emitted while the completion animation runs; `percent` is
    /// monotonically non-decreasing, `fact_index` points into the rotating
    /// fact set.
    async fn completion_progress(&self, percent: u8, fact_index: usize);
}
