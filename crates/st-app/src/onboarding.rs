//! Onboarding controller.
//!
//! Drives the pure wizard state machine and owns its side effects: the
//! debounced cursor autosave and the fixed-duration completion animation.
//! The debounce timer is an explicit handle, aborted on every re-schedule
//! and on teardown, so no stale write can fire after the cursor moved on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::task::AbortHandle;
use tokio::time::{interval, sleep, Duration, Instant};
use tracing::{debug, info, warn};

use st_core::onboarding::{
    fact_index_at, progress_percent_at, WizardAction, WizardEvent, WizardState,
    WizardStateMachine, COMPLETION_DURATION_MS, COMPLETION_HOLD_MS, INTRO_STEP, LAST_STEP,
};
use st_core::ports::{OnboardingEventPort, ProfileStorePort};
use st_core::profile::{ProfileUpdate, UserProfile};

use crate::coordinator::AuthCoordinator;

pub struct OnboardingController {
    uid: String,
    profiles: Arc<dyn ProfileStorePort>,
    coordinator: Arc<AuthCoordinator>,
    events: Arc<dyn OnboardingEventPort>,
    debounce: Duration,

    state: Arc<StdMutex<WizardState>>,
    /// Last cursor value acknowledged by the store; writes for an equal
    /// cursor are suppressed to avoid echo loops with resume.
    last_saved: Arc<StdMutex<Option<i8>>>,
    pending_save: Arc<StdMutex<Option<AbortHandle>>>,
    resumed: AtomicBool,
    completion_started: AtomicBool,
}

impl OnboardingController {
    pub fn new(
        uid: impl Into<String>,
        profiles: Arc<dyn ProfileStorePort>,
        coordinator: Arc<AuthCoordinator>,
        events: Arc<dyn OnboardingEventPort>,
        debounce_ms: u64,
    ) -> Self {
        Self {
            uid: uid.into(),
            profiles,
            coordinator,
            events,
            debounce: Duration::from_millis(debounce_ms),
            state: Arc::new(StdMutex::new(WizardState::AtStep(INTRO_STEP))),
            last_saved: Arc::new(StdMutex::new(None)),
            pending_save: Arc::new(StdMutex::new(None)),
            resumed: AtomicBool::new(false),
            completion_started: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> WizardState {
        *self.state.lock().unwrap()
    }

    /// Seed the cursor from the profile's saved step. Runs exactly once per
    /// controller; later profile refreshes never reset an in-progress
    /// cursor. The seeded value is treated as already persisted.
    pub async fn resume(&self, profile: &UserProfile) {
        if self.resumed.swap(true, Ordering::SeqCst) {
            return;
        }
        let cursor = profile
            .onboarding_step
            .unwrap_or(INTRO_STEP)
            .clamp(INTRO_STEP, LAST_STEP);
        *self.state.lock().unwrap() = WizardState::AtStep(cursor);
        *self.last_saved.lock().unwrap() = Some(cursor);
        info!(cursor, "onboarding resumed");
        self.events
            .wizard_state_changed(WizardState::AtStep(cursor))
            .await;
    }

    pub async fn next(&self) -> WizardState {
        self.dispatch(WizardEvent::Next).await
    }

    pub async fn back(&self) -> WizardState {
        self.dispatch(WizardEvent::Back).await
    }

    pub async fn skip(&self) -> WizardState {
        self.dispatch(WizardEvent::Skip).await
    }

    /// Abort any pending debounced write. Must be called on teardown.
    pub fn shutdown(&self) {
        if let Some(handle) = self.pending_save.lock().unwrap().take() {
            handle.abort();
        }
    }

    async fn dispatch(&self, event: WizardEvent) -> WizardState {
        let (next, actions) = {
            let mut state = self.state.lock().unwrap();
            let (next, actions) = WizardStateMachine::transition(*state, event);
            *state = next;
            (next, actions)
        };
        debug!(?event, ?next, "wizard transition");
        self.events.wizard_state_changed(next).await;

        for action in actions {
            match action {
                WizardAction::PersistStep(cursor) => self.schedule_save(cursor),
                WizardAction::MarkComplete => self.mark_complete().await,
            }
        }

        if next == WizardState::Completing {
            self.start_completion();
        }
        next
    }

    /// Debounced cursor autosave. A pending timer is cancelled and
    /// rescheduled on every change (last-write-wins after quiescence); the
    /// write is skipped when the cursor already equals the last acknowledged
    /// value.
    fn schedule_save(&self, cursor: i8) {
        let mut pending = self.pending_save.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        if *self.last_saved.lock().unwrap() == Some(cursor) {
            debug!(cursor, "cursor already persisted; skipping autosave");
            return;
        }

        let uid = self.uid.clone();
        let profiles = Arc::clone(&self.profiles);
        let last_saved = Arc::clone(&self.last_saved);
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            sleep(debounce).await;
            match profiles
                .write_partial(&uid, &ProfileUpdate::onboarding_step(cursor))
                .await
            {
                Ok(()) => {
                    *last_saved.lock().unwrap() = Some(cursor);
                    debug!(cursor, "onboarding step persisted");
                }
                // Saves are optimistic: navigation already happened.
                Err(err) => warn!(error = %err, cursor, "failed to save onboarding step"),
            }
        });
        *pending = Some(handle.abort_handle());
    }

    /// Run the fixed-duration completion animation, then finish the wizard.
    /// Non-interruptible once started.
    fn start_completion(&self) {
        if self.completion_started.swap(true, Ordering::SeqCst) {
            return;
        }
        // The wizard is done; a trailing cursor write would resurrect it.
        self.shutdown();

        let uid = self.uid.clone();
        let profiles = Arc::clone(&self.profiles);
        let coordinator = Arc::clone(&self.coordinator);
        let events = Arc::clone(&self.events);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            run_completion_animation(events.as_ref()).await;

            let (next, actions) = {
                let mut state = state.lock().unwrap();
                let (next, actions) =
                    WizardStateMachine::transition(*state, WizardEvent::AnimationFinished);
                *state = next;
                (next, actions)
            };
            events.wizard_state_changed(next).await;

            for action in actions {
                if action == WizardAction::MarkComplete {
                    mark_complete(&uid, profiles.as_ref(), &coordinator).await;
                }
            }
        });
    }

    async fn mark_complete(&self) {
        mark_complete(&self.uid, self.profiles.as_ref(), &self.coordinator).await;
    }
}

impl Drop for OnboardingController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_completion_animation(events: &dyn OnboardingEventPort) {
    let start = Instant::now();
    let mut ticker = interval(Duration::from_millis(100));
    let mut last_emitted = None;
    loop {
        ticker.tick().await;
        let elapsed = start.elapsed().as_millis() as i64;
        let percent = progress_percent_at(elapsed);
        let fact_index = fact_index_at(elapsed);
        if last_emitted != Some((percent, fact_index)) {
            events.completion_progress(percent, fact_index).await;
            last_emitted = Some((percent, fact_index));
        }
        if elapsed >= COMPLETION_DURATION_MS {
            break;
        }
    }
    // Brief hold at 100% before leaving the screen.
    sleep(Duration::from_millis(COMPLETION_HOLD_MS as u64)).await;
}

/// Completion is unconditional: a failed store write is logged, not retried,
/// and never blocks the transition.
async fn mark_complete(uid: &str, profiles: &dyn ProfileStorePort, coordinator: &AuthCoordinator) {
    match profiles.mark_onboarding_complete(uid).await {
        Ok(()) => info!(uid, "onboarding marked complete"),
        Err(err) => warn!(error = %err, uid, "failed to mark onboarding complete; continuing"),
    }
    coordinator.set_onboarding_complete().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;

    use st_core::auth::{AuthError, AuthenticatedIdentity, ProviderIdentity, SessionChange};
    use st_core::FederatedProvider;
    use st_infra::memory::{MemoryAuthCache, MemoryProfileStore};

    #[derive(Default)]
    struct RecordingEvents {
        states: StdMutex<Vec<WizardState>>,
        progress: StdMutex<Vec<(u8, usize)>>,
    }

    impl RecordingEvents {
        fn states(&self) -> Vec<WizardState> {
            self.states.lock().unwrap().clone()
        }

        fn progress(&self) -> Vec<(u8, usize)> {
            self.progress.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OnboardingEventPort for RecordingEvents {
        async fn wizard_state_changed(&self, state: WizardState) {
            self.states.lock().unwrap().push(state);
        }

        async fn completion_progress(&self, percent: u8, fact_index: usize) {
            self.progress.lock().unwrap().push((percent, fact_index));
        }
    }

    /// Gateway stub: the controller itself never talks to the identity
    /// provider, but the coordinator it notifies needs one.
    struct NoopGateway;

    #[async_trait]
    impl st_core::ports::IdentityGatewayPort for NoopGateway {
        async fn sign_in_email(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<AuthenticatedIdentity, AuthError> {
            Err(AuthError::OperationNotAllowed)
        }

        async fn sign_up_email(
            &self,
            _email: &str,
            _password: &str,
            _display_name: Option<&str>,
        ) -> Result<AuthenticatedIdentity, AuthError> {
            Err(AuthError::OperationNotAllowed)
        }

        async fn sign_in_federated(
            &self,
            _provider: FederatedProvider,
        ) -> Result<AuthenticatedIdentity, AuthError> {
            Err(AuthError::OperationNotAllowed)
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }

        async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn current_identity(&self) -> Option<ProviderIdentity> {
            None
        }

        async fn id_token(&self) -> Option<String> {
            None
        }

        async fn subscribe_sessions(&self) -> mpsc::Receiver<SessionChange> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }
    }

    fn profile(step: Option<i8>) -> UserProfile {
        let mut profile = UserProfile::bootstrap(&ProviderIdentity {
            uid: "uid-wiz".to_string(),
            email: "wiz@b.com".to_string(),
            display_name: None,
            photo_url: None,
        });
        profile.onboarding_step = step;
        profile
    }

    struct Harness {
        controller: OnboardingController,
        store: Arc<MemoryProfileStore>,
        events: Arc<RecordingEvents>,
        coordinator: Arc<AuthCoordinator>,
    }

    async fn harness(saved_step: Option<i8>) -> Harness {
        let store = Arc::new(MemoryProfileStore::new());
        let seeded = profile(saved_step);
        store.create_profile("uid-wiz", &seeded).await.unwrap();

        let coordinator = Arc::new(AuthCoordinator::new(
            Arc::new(NoopGateway),
            store.clone(),
            Arc::new(MemoryAuthCache::new()),
        ));
        let events = Arc::new(RecordingEvents::default());
        let controller = OnboardingController::new(
            "uid-wiz",
            store.clone(),
            coordinator.clone(),
            events.clone(),
            500,
        );
        controller.resume(&seeded).await;

        Harness {
            controller,
            store,
            events,
            coordinator,
        }
    }

    async fn stored_step(store: &MemoryProfileStore) -> Option<i8> {
        store
            .read_profile("uid-wiz")
            .await
            .unwrap()
            .unwrap()
            .onboarding_step
    }

    #[tokio::test(start_paused = true)]
    async fn three_rapid_steps_persist_exactly_one_write() {
        let h = harness(None).await;

        h.controller.next().await;
        h.controller.next().await;
        h.controller.next().await;
        assert_eq!(h.controller.state(), WizardState::AtStep(2));

        assert_eq!(h.store.partial_write_count(), 0);
        sleep(Duration::from_millis(600)).await;

        assert_eq!(h.store.partial_write_count(), 1);
        assert_eq!(stored_step(&h.store).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn write_suppressed_when_cursor_returns_to_acknowledged_value() {
        let h = harness(Some(2)).await;
        assert_eq!(h.controller.state(), WizardState::AtStep(2));

        h.controller.back().await;
        h.controller.next().await;
        sleep(Duration::from_millis(1_000)).await;

        assert_eq!(h.store.partial_write_count(), 0);
        assert_eq!(stored_step(&h.store).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_runs_once_and_later_refreshes_cannot_reset_the_cursor() {
        let h = harness(Some(2)).await;
        assert_eq!(h.controller.state(), WizardState::AtStep(2));

        h.controller.next().await;
        // A remote profile refresh arriving mid-flow must not rewind.
        h.controller.resume(&profile(Some(0))).await;
        assert_eq!(h.controller.state(), WizardState::AtStep(3));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_without_saved_step_starts_at_intro() {
        let h = harness(None).await;
        assert_eq!(h.controller.state(), WizardState::AtStep(INTRO_STEP));
    }

    #[tokio::test(start_paused = true)]
    async fn back_at_intro_stays_put_and_writes_nothing() {
        let h = harness(None).await;

        h.controller.back().await;
        sleep(Duration::from_millis(1_000)).await;

        assert_eq!(h.controller.state(), WizardState::AtStep(INTRO_STEP));
        assert_eq!(h.store.partial_write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_completes_even_when_the_store_write_fails() {
        let h = harness(Some(1)).await;
        h.store.fail_writes(true);

        assert_eq!(h.controller.skip().await, WizardState::Completing);

        // Paused clock: sleeping past the animation auto-advances through it.
        sleep(Duration::from_millis(
            (COMPLETION_DURATION_MS + COMPLETION_HOLD_MS + 1_000) as u64,
        ))
        .await;

        assert_eq!(h.controller.state(), WizardState::Complete);
        assert_eq!(h.store.mark_complete_calls(), 1);
        // The store still holds the old document, but the in-memory profile
        // moved on.
        let user = h.coordinator.state().user;
        assert!(user.is_none() || user.unwrap().completed_onboarding);

        let progress = h.events.progress();
        assert!(!progress.is_empty());
        assert_eq!(progress.last().unwrap().0, 100);
        let mut last = 0;
        for (percent, _) in progress {
            assert!(percent >= last, "progress must never decrease");
            last = percent;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn next_at_last_step_runs_completion_and_marks_the_store() {
        let h = harness(Some(LAST_STEP)).await;

        assert_eq!(h.controller.next().await, WizardState::Completing);
        sleep(Duration::from_millis(
            (COMPLETION_DURATION_MS + COMPLETION_HOLD_MS + 1_000) as u64,
        ))
        .await;

        assert_eq!(h.controller.state(), WizardState::Complete);
        assert_eq!(h.store.mark_complete_calls(), 1);
        let stored = h.store.read_profile("uid-wiz").await.unwrap().unwrap();
        assert!(stored.completed_onboarding);
        assert_eq!(stored.onboarding_step, None);

        assert!(h
            .events
            .states()
            .iter()
            .any(|s| *s == WizardState::Complete));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_starts_only_once() {
        let h = harness(Some(1)).await;

        h.controller.skip().await;
        h.controller.skip().await;
        sleep(Duration::from_millis(
            (COMPLETION_DURATION_MS + COMPLETION_HOLD_MS + 1_000) as u64,
        ))
        .await;

        assert_eq!(h.store.mark_complete_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_a_pending_autosave() {
        let h = harness(None).await;

        h.controller.next().await;
        h.controller.shutdown();
        sleep(Duration::from_millis(1_000)).await;

        assert_eq!(h.store.partial_write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entering_completion_cancels_the_pending_cursor_write() {
        let h = harness(None).await;

        h.controller.next().await;
        h.controller.skip().await;
        sleep(Duration::from_millis(
            (COMPLETION_DURATION_MS + COMPLETION_HOLD_MS + 1_000) as u64,
        ))
        .await;

        // Only the completion mark, never the stale cursor write.
        assert_eq!(h.store.partial_write_count(), 0);
        let stored = h.store.read_profile("uid-wiz").await.unwrap().unwrap();
        assert!(stored.completed_onboarding);
        assert_eq!(stored.onboarding_step, None);
    }
}
