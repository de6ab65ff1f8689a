//! Application dependency grouping.
//!
//! The composition root assembles one of these from infrastructure adapters
//! and hands it to [`App::start`](crate::App::start). The struct IS the
//! dependency manifest: all ports must be provided, no defaults.

use std::sync::Arc;

use st_core::config::AppConfig;
use st_core::ports::{
    AuthCachePort, IdentityGatewayPort, OnboardingEventPort, ProfileStorePort,
};

pub struct AppDeps {
    pub identity: Arc<dyn IdentityGatewayPort>,
    pub profiles: Arc<dyn ProfileStorePort>,
    pub auth_cache: Arc<dyn AuthCachePort>,
    pub onboarding_events: Arc<dyn OnboardingEventPort>,
    pub config: AppConfig,
}
