//! End-to-end flows over the in-memory adapters: sign-up through onboarding
//! to home, resume, federated cancellation, and restart rehydration.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use st_app::{App, AppBuilder};
use st_core::auth::{AuthError, PersistedAuthState, ProviderIdentity};
use st_core::onboarding::WizardState;
use st_core::ports::{OnboardingEventPort, ProfileStorePort};
use st_core::profile::UserProfile;
use st_core::routing::{decide_onboarding, decide_protected, RouteDecision, HOME, ONBOARDING};
use st_core::FederatedProvider;
use st_infra::memory::{MemoryAuthCache, MemoryIdentityGateway, MemoryProfileStore};

#[derive(Default)]
struct RecordingEvents {
    progress: StdMutex<Vec<(u8, usize)>>,
}

#[async_trait]
impl OnboardingEventPort for RecordingEvents {
    async fn wizard_state_changed(&self, _state: WizardState) {}

    async fn completion_progress(&self, percent: u8, fact_index: usize) {
        self.progress.lock().unwrap().push((percent, fact_index));
    }
}

struct World {
    app: App,
    gateway: Arc<MemoryIdentityGateway>,
    store: Arc<MemoryProfileStore>,
    cache: Arc<MemoryAuthCache>,
    events: Arc<RecordingEvents>,
}

async fn start_world(cache: Arc<MemoryAuthCache>) -> World {
    let gateway = Arc::new(MemoryIdentityGateway::new());
    let store = Arc::new(MemoryProfileStore::new());
    let events = Arc::new(RecordingEvents::default());

    let deps = AppBuilder::new()
        .with_identity(gateway.clone())
        .with_profiles(store.clone())
        .with_auth_cache(cache.clone())
        .with_onboarding_events(events.clone())
        .build()
        .expect("all ports provided");
    let app = App::start(deps).await;

    World {
        app,
        gateway,
        store,
        cache,
        events,
    }
}

const ANIMATION_MS: u64 = 12_000;

#[tokio::test(start_paused = true)]
async fn fresh_signup_walks_through_onboarding_to_home() {
    let world = start_world(Arc::new(MemoryAuthCache::new())).await;
    let coordinator = world.app.coordinator();

    coordinator
        .signup_with_email("a@b.com", "Secret123", "Secret123", None)
        .await
        .unwrap();

    let state = coordinator.state();
    let user = state.user.clone().expect("profile cached after signup");
    assert!(!user.completed_onboarding);
    assert_eq!(user.onboarding_step, None);
    assert_eq!(
        decide_protected(&state),
        RouteDecision::RedirectTo(ONBOARDING)
    );
    assert_eq!(decide_onboarding(&state), RouteDecision::Render);

    let controller = world.app.onboarding_controller(user.id.clone());
    controller.resume(&user).await;
    assert_eq!(controller.state(), WizardState::AtStep(-1));

    controller.next().await;
    controller.next().await;
    assert_eq!(controller.state(), WizardState::AtStep(1));

    assert_eq!(controller.skip().await, WizardState::Completing);
    sleep(Duration::from_millis(ANIMATION_MS)).await;
    assert_eq!(controller.state(), WizardState::Complete);

    let stored = world.store.read_profile(&user.id).await.unwrap().unwrap();
    assert!(stored.completed_onboarding);
    assert_eq!(stored.onboarding_step, None);

    let state = coordinator.state();
    assert_eq!(decide_protected(&state), RouteDecision::Render);
    assert_eq!(decide_onboarding(&state), RouteDecision::RedirectTo(HOME));

    let progress = world.events.progress.lock().unwrap().clone();
    assert_eq!(progress.last().unwrap().0, 100);

    world.app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn saved_step_resumes_the_wizard_mid_flow() {
    let world = start_world(Arc::new(MemoryAuthCache::new())).await;
    let coordinator = world.app.coordinator();

    let identity = world.gateway.register("back@b.com", "Secret123");
    let mut profile = UserProfile::bootstrap(&identity);
    profile.onboarding_step = Some(2);
    world
        .store
        .create_profile(&identity.uid, &profile)
        .await
        .unwrap();

    coordinator
        .login_with_email("back@b.com", "Secret123")
        .await
        .unwrap();

    let user = coordinator.state().user.unwrap();
    assert_eq!(user.onboarding_step, Some(2));

    let controller = world.app.onboarding_controller(user.id.clone());
    controller.resume(&user).await;
    // Steps 0 and 1 are skipped entirely.
    assert_eq!(controller.state(), WizardState::AtStep(2));

    world.app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn dismissed_federated_popup_leaves_no_trace() {
    let world = start_world(Arc::new(MemoryAuthCache::new())).await;
    let coordinator = world.app.coordinator();

    world.gateway.script_federated(Err(AuthError::Cancelled));
    let err = coordinator
        .login_federated(FederatedProvider::Google)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        st_app::CoordinatorError::Auth(AuthError::Cancelled)
    ));

    let state = coordinator.state();
    assert!(state.error.is_none());
    assert!(!state.is_loading);
    assert!(!state.is_authenticated);

    world.app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn restart_renders_optimistically_then_corrects_in_the_background() {
    let identity = ProviderIdentity {
        uid: "uid-restart".to_string(),
        email: "restart@b.com".to_string(),
        display_name: None,
        photo_url: None,
    };
    let mut profile = UserProfile::bootstrap(&identity);
    profile.completed_onboarding = true;
    let cache = Arc::new(MemoryAuthCache::with_state(PersistedAuthState {
        user: Some(profile),
        token: Some("stale-token".to_string()),
        is_authenticated: true,
    }));

    let world = start_world(cache.clone()).await;
    let coordinator = world.app.coordinator();

    // First render: the rehydrated snapshot is trusted as-is.
    let state = coordinator.state();
    assert!(state.is_authenticated);
    assert!(!state.is_loading);
    assert_eq!(decide_protected(&state), RouteDecision::Render);

    // The provider has no session, so the background refresh corrects it.
    sleep(Duration::from_millis(100)).await;
    let state = coordinator.state();
    assert!(!state.is_authenticated);
    assert!(state.error.is_none());
    assert!(world.cache.stored().is_none());

    world.app.shutdown();
}
