//! Auth coordinator.
//!
//! The single writer of session state. Actions run as asynchronous
//! operations with a strict pending → settled sequence per action; across
//! actions the last settled result wins. Everything else observes the state
//! through a watch subscription and never mutates it directly.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

use st_core::auth::{
    AuthError, AuthState, AuthenticatedIdentity, PersistedAuthState, ProviderIdentity,
    SessionChange, StoreError, ValidationError,
};
use st_core::ports::{AuthCachePort, IdentityGatewayPort, ProfileStorePort};
use st_core::profile::{ProfileUpdate, UserProfile};
use st_core::FederatedProvider;

/// Errors produced by coordinator actions.
///
/// The display string is what lands in the user-visible error field.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoordinatorError {
    fn is_cancellation(&self) -> bool {
        matches!(self, CoordinatorError::Auth(err) if err.is_cancellation())
    }
}

/// Client-side state container for authentication status, the cached
/// profile, and loading/error flags.
///
/// Session-establishing actions are not deduplicated here; callers disable
/// the triggering control while `is_loading` is set.
pub struct AuthCoordinator {
    identity: Arc<dyn IdentityGatewayPort>,
    profiles: Arc<dyn ProfileStorePort>,
    auth_cache: Arc<dyn AuthCachePort>,
    state_tx: watch::Sender<AuthState>,
}

impl AuthCoordinator {
    pub fn new(
        identity: Arc<dyn IdentityGatewayPort>,
        profiles: Arc<dyn ProfileStorePort>,
        auth_cache: Arc<dyn AuthCachePort>,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::default());
        Self {
            identity,
            profiles,
            auth_cache,
            state_tx,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Rehydrate the whitelisted slice from the local cache. Called once at
    /// startup, before first render; the persisted snapshot is
    /// stale-tolerant and corrected by the background session refresh.
    pub async fn hydrate(&self) {
        match self.auth_cache.load().await {
            Ok(Some(slice)) => {
                self.state_tx.send_modify(|state| slice.apply_to(state));
                info!(
                    authenticated = slice.is_authenticated,
                    "rehydrated persisted auth state"
                );
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to load persisted auth state"),
        }
    }

    pub async fn login_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), CoordinatorError> {
        let span = info_span!("coordinator.login_email");
        async {
            self.begin_session_action().await;
            match self.identity.sign_in_email(email, password).await {
                Ok(auth) => {
                    let profile = self.upsert_profile(&auth.identity, None).await;
                    info!(uid = %auth.identity.uid, "email sign-in succeeded");
                    self.complete_sign_in(auth, profile).await;
                    Ok(())
                }
                Err(err) => {
                    let err = CoordinatorError::from(err);
                    self.fail_session_action(&err).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// The password confirmation is validated before any network call.
    pub async fn signup_with_email(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
        display_name: Option<&str>,
    ) -> Result<(), CoordinatorError> {
        let span = info_span!("coordinator.signup_email");
        async {
            if password != confirm_password {
                let err = CoordinatorError::from(ValidationError::PasswordMismatch);
                let message = err.to_string();
                self.apply(move |state| state.error = Some(message)).await;
                return Err(err);
            }

            self.begin_session_action().await;
            match self
                .identity
                .sign_up_email(email, password, display_name)
                .await
            {
                Ok(auth) => {
                    let profile = self.upsert_profile(&auth.identity, display_name).await;
                    info!(uid = %auth.identity.uid, "email sign-up succeeded");
                    self.complete_sign_in(auth, profile).await;
                    Ok(())
                }
                Err(err) => {
                    let err = CoordinatorError::from(err);
                    self.fail_session_action(&err).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn login_federated(
        &self,
        provider: FederatedProvider,
    ) -> Result<(), CoordinatorError> {
        let span = info_span!("coordinator.login_federated", provider = ?provider);
        async {
            self.begin_session_action().await;
            match self.identity.sign_in_federated(provider).await {
                Ok(auth) => {
                    let profile = self.upsert_profile(&auth.identity, None).await;
                    info!(uid = %auth.identity.uid, "federated sign-in succeeded");
                    self.complete_sign_in(auth, profile).await;
                    Ok(())
                }
                Err(err) => {
                    let err = CoordinatorError::from(err);
                    self.fail_session_action(&err).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn logout(&self) -> Result<(), CoordinatorError> {
        let span = info_span!("coordinator.logout");
        async {
            self.apply(|state| state.is_loading = true).await;
            match self.identity.sign_out().await {
                Ok(()) => {
                    self.state_tx.send_modify(AuthState::reset_signed_out);
                    if let Err(err) = self.auth_cache.clear().await {
                        warn!(error = %err, "failed to clear persisted auth state");
                    }
                    info!("signed out");
                    Ok(())
                }
                Err(err) => {
                    let err = CoordinatorError::from(err);
                    self.fail_session_action(&err).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Handle one emission of the session stream. `None` transitions
    /// straight to signed-out; `Some` refreshes the token and profile. Sets
    /// the loading flag only when no auth state is known yet, so background
    /// refreshes over a rehydrated session never flash a loading screen.
    pub async fn check_auth_state(&self, change: SessionChange) -> Result<(), CoordinatorError> {
        let span = info_span!("coordinator.check_auth_state", signed_in = change.is_some());
        async {
            let Some(identity) = change else {
                self.state_tx.send_modify(AuthState::reset_signed_out);
                if let Err(err) = self.auth_cache.clear().await {
                    warn!(error = %err, "failed to clear persisted auth state");
                }
                return Ok(());
            };

            if !self.state_tx.borrow().has_known_session() {
                self.apply(|state| state.is_loading = true).await;
            }

            match self.refresh_session(&identity).await {
                Ok((profile, token)) => {
                    self.apply(move |state| {
                        state.user = Some(profile);
                        state.token = Some(token);
                        state.is_authenticated = true;
                        state.is_loading = false;
                        state.error = None;
                    })
                    .await;
                    Ok(())
                }
                Err(err) => {
                    // A half-known session is worse than none: clear it.
                    let message = err.to_string();
                    self.apply(move |state| {
                        state.reset_signed_out();
                        state.error = Some(message);
                    })
                    .await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Merge-write profile fields and swap in the refreshed document.
    /// Deliberately leaves `is_loading` alone: saves run in the background
    /// and never block the UI.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), CoordinatorError> {
        let span = info_span!("coordinator.update_profile");
        async {
            self.apply(|state| state.error = None).await;
            match self.try_update_profile(&update).await {
                Ok(profile) => {
                    self.apply(move |state| {
                        state.user = Some(profile);
                        state.error = None;
                    })
                    .await;
                    Ok(())
                }
                Err(err) => {
                    let message = err.to_string();
                    self.apply(move |state| state.error = Some(message)).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Flip the cached profile's completion flag after the wizard finishes.
    /// The store write happens in the onboarding controller; this only keeps
    /// the in-memory snapshot consistent.
    pub async fn set_onboarding_complete(&self) {
        self.apply(|state| {
            if let Some(user) = &mut state.user {
                user.completed_onboarding = true;
                user.onboarding_step = None;
            }
        })
        .await;
    }

    pub async fn clear_error(&self) {
        self.apply(|state| state.error = None).await;
    }

    // -- internal ----------------------------------------------------------

    /// Single mutation path: every change goes through here and the
    /// whitelisted slice is persisted after each one.
    async fn apply<F>(&self, mutate: F)
    where
        F: FnOnce(&mut AuthState),
    {
        self.state_tx.send_modify(mutate);
        let slice = PersistedAuthState::snapshot(&self.state_tx.borrow());
        if let Err(err) = self.auth_cache.save(&slice).await {
            warn!(error = %err, "failed to persist auth snapshot");
        }
    }

    async fn begin_session_action(&self) {
        self.apply(|state| {
            state.is_loading = true;
            state.error = None;
        })
        .await;
    }

    async fn complete_sign_in(&self, auth: AuthenticatedIdentity, profile: UserProfile) {
        self.apply(move |state| {
            state.user = Some(profile);
            state.token = Some(auth.token);
            state.is_authenticated = true;
            state.is_loading = false;
            state.error = None;
        })
        .await;
    }

    async fn fail_session_action(&self, err: &CoordinatorError) {
        let message = (!err.is_cancellation()).then(|| err.to_string());
        self.apply(move |state| {
            state.is_loading = false;
            if let Some(message) = message {
                state.error = Some(message);
            }
        })
        .await;
    }

    async fn refresh_session(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<(UserProfile, String), CoordinatorError> {
        let token = self
            .identity
            .id_token()
            .await
            .ok_or(AuthError::Unknown)?;
        let profile = match self.profiles.read_profile(&identity.uid).await? {
            Some(profile) => profile,
            None => self.create_profile_document(identity).await,
        };
        Ok((profile, token))
    }

    /// Profile document upsert on successful authentication: first sign-in
    /// creates the document with defaults, repeat sign-ins only refresh the
    /// last-seen stamp. Existing fields are never clobbered.
    async fn upsert_profile(
        &self,
        identity: &ProviderIdentity,
        display_name: Option<&str>,
    ) -> UserProfile {
        let mut identity = identity.clone();
        if identity.display_name.is_none() {
            identity.display_name = display_name.map(str::to_string);
        }

        match self.profiles.read_profile(&identity.uid).await {
            Ok(Some(profile)) => {
                if let Err(err) = self
                    .profiles
                    .write_partial(&identity.uid, &ProfileUpdate::touch())
                    .await
                {
                    warn!(error = %err, uid = %identity.uid, "last-seen touch failed");
                }
                profile
            }
            Ok(None) => self.create_profile_document(&identity).await,
            Err(err) => {
                // Never block sign-in on the store: degrade to an in-memory
                // profile and let the next session refresh repair it.
                warn!(error = %err, uid = %identity.uid, "profile read failed during sign-in; using in-memory profile");
                UserProfile::bootstrap(&identity)
            }
        }
    }

    async fn create_profile_document(&self, identity: &ProviderIdentity) -> UserProfile {
        let profile = UserProfile::bootstrap(identity);
        info!(uid = %identity.uid, "creating profile document");
        if let Err(err) = self.profiles.create_profile(&identity.uid, &profile).await {
            warn!(error = %err, uid = %identity.uid, "profile document creation failed; continuing with in-memory profile");
        }
        profile
    }

    async fn try_update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, CoordinatorError> {
        let identity = self
            .identity
            .current_identity()
            .await
            .ok_or(StoreError::NotAuthenticated)?;
        self.profiles.write_partial(&identity.uid, update).await?;
        let refreshed = self
            .profiles
            .read_profile(&identity.uid)
            .await?
            .ok_or_else(|| StoreError::Unavailable("profile disappeared during update".into()))?;
        Ok(refreshed)
    }
}
