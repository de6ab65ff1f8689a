//! Builder for assembling the application runtime.

use std::sync::Arc;

use st_core::config::AppConfig;
use st_core::ports::{
    AuthCachePort, IdentityGatewayPort, OnboardingEventPort, ProfileStorePort,
};

use crate::coordinator::AuthCoordinator;
use crate::deps::AppDeps;
use crate::observer::SessionObserver;
use crate::onboarding::OnboardingController;

pub struct AppBuilder {
    identity: Option<Arc<dyn IdentityGatewayPort>>,
    profiles: Option<Arc<dyn ProfileStorePort>>,
    auth_cache: Option<Arc<dyn AuthCachePort>>,
    onboarding_events: Option<Arc<dyn OnboardingEventPort>>,
    config: AppConfig,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            identity: None,
            profiles: None,
            auth_cache: None,
            onboarding_events: None,
            config: AppConfig::default(),
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityGatewayPort>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileStorePort>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_auth_cache(mut self, auth_cache: Arc<dyn AuthCachePort>) -> Self {
        self.auth_cache = Some(auth_cache);
        self
    }

    pub fn with_onboarding_events(mut self, events: Arc<dyn OnboardingEventPort>) -> Self {
        self.onboarding_events = Some(events);
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> anyhow::Result<AppDeps> {
        Ok(AppDeps {
            identity: self
                .identity
                .ok_or_else(|| anyhow::anyhow!("IdentityGatewayPort is required"))?,
            profiles: self
                .profiles
                .ok_or_else(|| anyhow::anyhow!("ProfileStorePort is required"))?,
            auth_cache: self
                .auth_cache
                .ok_or_else(|| anyhow::anyhow!("AuthCachePort is required"))?,
            onboarding_events: self
                .onboarding_events
                .ok_or_else(|| anyhow::anyhow!("OnboardingEventPort is required"))?,
            config: self.config,
        })
    }
}

/// The application runtime: the coordinator plus its session observer.
pub struct App {
    coordinator: Arc<AuthCoordinator>,
    observer: SessionObserver,
    profiles: Arc<dyn ProfileStorePort>,
    onboarding_events: Arc<dyn OnboardingEventPort>,
    config: AppConfig,
}

impl App {
    /// Startup sequence: rehydrate the persisted slice so the first render
    /// is optimistic, then subscribe to the session stream for the
    /// background refresh.
    pub async fn start(deps: AppDeps) -> Self {
        let coordinator = Arc::new(AuthCoordinator::new(
            Arc::clone(&deps.identity),
            Arc::clone(&deps.profiles),
            Arc::clone(&deps.auth_cache),
        ));
        coordinator.hydrate().await;
        let observer = SessionObserver::spawn(Arc::clone(&deps.identity), Arc::clone(&coordinator)).await;

        Self {
            coordinator,
            observer,
            profiles: deps.profiles,
            onboarding_events: deps.onboarding_events,
            config: deps.config,
        }
    }

    pub fn coordinator(&self) -> Arc<AuthCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// A wizard controller bound to the authenticated user. One per
    /// onboarding mount.
    pub fn onboarding_controller(&self, uid: impl Into<String>) -> OnboardingController {
        OnboardingController::new(
            uid,
            Arc::clone(&self.profiles),
            Arc::clone(&self.coordinator),
            Arc::clone(&self.onboarding_events),
            self.config.autosave_debounce_ms,
        )
    }

    /// Tear down the session subscription.
    pub fn shutdown(self) {
        self.observer.shutdown();
    }
}
