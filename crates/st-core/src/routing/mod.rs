//! Route guard decisions.
//!
//! Pure functions of coordinator state. The navigation surface renders the
//! decision; nothing here touches a rendering framework.

use crate::auth::AuthState;

pub const LOGIN: &str = "/login";
pub const ONBOARDING: &str = "/onboarding";
pub const HOME: &str = "/home";
pub const INSIGHTS: &str = "/insights";
pub const READ: &str = "/read";
pub const PROFILE: &str = "/profile";

/// Outcome of a route guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested view.
    Render,
    /// First-ever load: nothing known yet, show the loading placeholder.
    Loading,
    /// Redirect to the given route.
    RedirectTo(&'static str),
}

/// Guard for protected views (`/home`, `/insights`, `/read`, `/profile`).
pub fn decide_protected(state: &AuthState) -> RouteDecision {
    if state.is_loading && !state.has_known_session() {
        return RouteDecision::Loading;
    }
    if !state.is_authenticated {
        return RouteDecision::RedirectTo(LOGIN);
    }
    let completed = state
        .user
        .as_ref()
        .map(|user| user.completed_onboarding)
        .unwrap_or(false);
    if !completed {
        return RouteDecision::RedirectTo(ONBOARDING);
    }
    RouteDecision::Render
}

/// Guard for the onboarding route: the inverse completed-onboarding check.
pub fn decide_onboarding(state: &AuthState) -> RouteDecision {
    if state.is_loading && !state.has_known_session() {
        return RouteDecision::Loading;
    }
    if !state.is_authenticated {
        return RouteDecision::RedirectTo(LOGIN);
    }
    let completed = state
        .user
        .as_ref()
        .map(|user| user.completed_onboarding)
        .unwrap_or(false);
    if completed {
        return RouteDecision::RedirectTo(HOME);
    }
    RouteDecision::Render
}
