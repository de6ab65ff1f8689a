//! spot-it Application Orchestration Layer
//!
//! This crate contains the auth coordinator, the session observer, the
//! onboarding controller, and the composition root that wires them to the
//! infrastructure adapters.

pub mod builder;
pub mod coordinator;
pub mod deps;
pub mod observer;
pub mod onboarding;

pub use builder::{App, AppBuilder};
pub use coordinator::{AuthCoordinator, CoordinatorError};
pub use deps::AppDeps;
pub use observer::SessionObserver;
pub use onboarding::OnboardingController;
