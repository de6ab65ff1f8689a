//! In-memory fakes.
//!
//! Deterministic implementations of the ports for tests and offline
//! development: a scripted identity gateway with a live session stream and a
//! HashMap-backed document store with merge semantics.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use st_core::auth::{
    AuthError, AuthenticatedIdentity, PersistedAuthState, ProviderIdentity, SessionChange,
    StoreError,
};
use st_core::ports::{AuthCachePort, IdentityGatewayPort, ProfileStorePort};
use st_core::profile::{ProfileUpdate, UserProfile};
use st_core::FederatedProvider;

const SESSION_CHANNEL_CAPACITY: usize = 16;
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    identity: ProviderIdentity,
}

/// Identity gateway fake: accounts registered up front or via sign-up,
/// federated outcomes scripted per call.
#[derive(Default)]
pub struct MemoryIdentityGateway {
    accounts: StdMutex<HashMap<String, Account>>,
    session: StdMutex<Option<(ProviderIdentity, String)>>,
    federated_script: StdMutex<VecDeque<Result<ProviderIdentity, AuthError>>>,
    subscribers: StdMutex<Vec<mpsc::Sender<SessionChange>>>,
}

impl MemoryIdentityGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register an email/password account.
    pub fn register(&self, email: &str, password: &str) -> ProviderIdentity {
        let identity = ProviderIdentity {
            uid: format!("uid-{}", uuid::Uuid::new_v4()),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    /// Queue the outcome of the next federated sign-in attempt.
    pub fn script_federated(&self, outcome: Result<ProviderIdentity, AuthError>) {
        self.federated_script.lock().unwrap().push_back(outcome);
    }

    fn establish(&self, identity: ProviderIdentity) -> AuthenticatedIdentity {
        let token = format!("token-{}", identity.uid);
        *self.session.lock().unwrap() = Some((identity.clone(), token.clone()));
        self.broadcast(Some(identity.clone()));
        AuthenticatedIdentity { identity, token }
    }

    fn broadcast(&self, change: SessionChange) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        for tx in subscribers.iter() {
            let _ = tx.try_send(change.clone());
        }
    }
}

#[async_trait]
impl IdentityGatewayPort for MemoryIdentityGateway {
    async fn sign_in_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let identity = {
            let accounts = self.accounts.lock().unwrap();
            let account = accounts.get(email).ok_or(AuthError::UserNotFound)?;
            if account.password != password {
                return Err(AuthError::InvalidCredentials);
            }
            account.identity.clone()
        };
        Ok(self.establish(identity))
    }

    async fn sign_up_email(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let identity = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            let identity = ProviderIdentity {
                uid: format!("uid-{}", uuid::Uuid::new_v4()),
                email: email.to_string(),
                display_name: display_name.map(str::to_string),
                photo_url: None,
            };
            accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    identity: identity.clone(),
                },
            );
            identity
        };
        Ok(self.establish(identity))
    }

    async fn sign_in_federated(
        &self,
        _provider: FederatedProvider,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let outcome = self
            .federated_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AuthError::OperationNotAllowed));
        outcome.map(|identity| self.establish(identity))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.lock().unwrap() = None;
        self.broadcast(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        if self.accounts.lock().unwrap().contains_key(email) {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }

    async fn current_identity(&self) -> Option<ProviderIdentity> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|(identity, _)| identity.clone())
    }

    async fn id_token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, token)| token.clone())
    }

    async fn subscribe_sessions(&self) -> mpsc::Receiver<SessionChange> {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let current = self.current_identity().await;
        let _ = tx.try_send(current);
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}

/// Document store fake with merge semantics and switchable failures.
/// Counters record attempts, including failed ones.
#[derive(Default)]
pub struct MemoryProfileStore {
    documents: StdMutex<HashMap<String, UserProfile>>,
    partial_writes: AtomicUsize,
    mark_complete_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn partial_write_count(&self) -> usize {
        self.partial_writes.load(Ordering::SeqCst)
    }

    pub fn mark_complete_calls(&self) -> usize {
        self.mark_complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStorePort for MemoryProfileStore {
    async fn read_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated read failure".into()));
        }
        Ok(self.documents.lock().unwrap().get(uid).cloned())
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        let mut stored = profile.clone();
        let now = Utc::now();
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        self.documents
            .lock()
            .unwrap()
            .insert(uid.to_string(), stored);
        Ok(())
    }

    async fn write_partial(&self, uid: &str, update: &ProfileUpdate) -> Result<(), StoreError> {
        self.partial_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        let mut documents = self.documents.lock().unwrap();
        let profile = documents
            .get_mut(uid)
            .ok_or_else(|| StoreError::Unavailable("no such document".into()))?;
        profile.apply(update);
        profile.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_onboarding_complete(&self, uid: &str) -> Result<(), StoreError> {
        self.mark_complete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        let mut documents = self.documents.lock().unwrap();
        let profile = documents
            .get_mut(uid)
            .ok_or_else(|| StoreError::Unavailable("no such document".into()))?;
        profile.completed_onboarding = true;
        profile.onboarding_step = None;
        profile.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// Auth cache fake.
#[derive(Default)]
pub struct MemoryAuthCache {
    stored: StdMutex<Option<PersistedAuthState>>,
}

impl MemoryAuthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedAuthState) -> Self {
        Self {
            stored: StdMutex::new(Some(state)),
        }
    }

    pub fn stored(&self) -> Option<PersistedAuthState> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthCachePort for MemoryAuthCache {
    async fn load(&self) -> anyhow::Result<Option<PersistedAuthState>> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn save(&self, state: &PersistedAuthState) -> anyhow::Result<()> {
        *self.stored.lock().unwrap() = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.stored.lock().unwrap() = None;
        Ok(())
    }
}
