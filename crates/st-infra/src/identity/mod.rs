//! REST identity gateway.
//!
//! Wraps the hosted identity provider's REST surface: email/password
//! sign-in and sign-up, federated credential exchange, password reset, and
//! a session-change stream fed by this process's own transitions. Raw
//! provider error codes are normalized through [`error_codes::map_auth_code`].

mod error_codes;
mod federated;
mod wire;

pub use error_codes::map_auth_code;
pub use federated::{FederatedCredential, FederatedFlowPort};

use std::sync::{Arc, Mutex as StdMutex, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use st_core::auth::{
    AuthError, AuthenticatedIdentity, ProviderIdentity, SessionChange,
};
use st_core::config::IdentityConfig;
use st_core::ports::IdentityGatewayPort;
use st_core::FederatedProvider;

use wire::{ErrorPayload, SignInResponse};

const SESSION_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct GatewaySession {
    identity: ProviderIdentity,
    id_token: String,
}

pub struct RestIdentityGateway {
    config: IdentityConfig,
    client: reqwest::Client,
    federated: Arc<dyn FederatedFlowPort>,
    session: RwLock<Option<GatewaySession>>,
    subscribers: StdMutex<Vec<mpsc::Sender<SessionChange>>>,
}

impl RestIdentityGateway {
    pub fn new(config: IdentityConfig, federated: Arc<dyn FederatedFlowPort>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            federated,
            session: RwLock::new(None),
            subscribers: StdMutex::new(Vec::new()),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}?key={}",
            self.config.base_url.trim_end_matches('/'),
            endpoint,
            self.config.api_key
        )
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, AuthError> {
        let response = self
            .client
            .post(self.endpoint_url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, endpoint, "identity request failed");
                AuthError::Unknown
            })?;

        if response.status().is_success() {
            response.json().await.map_err(|err| {
                warn!(error = %err, endpoint, "failed to parse identity response");
                AuthError::Unknown
            })
        } else {
            let status = response.status();
            let payload: ErrorPayload = response.json().await.unwrap_or_default();
            debug!(%status, code = %payload.error.message, endpoint, "identity request rejected");
            Err(map_auth_code(&payload.error.message))
        }
    }

    fn establish_session(&self, response: SignInResponse) -> AuthenticatedIdentity {
        let identity = response.identity();
        *self.session.write().unwrap() = Some(GatewaySession {
            identity: identity.clone(),
            id_token: response.id_token.clone(),
        });
        self.broadcast(Some(identity.clone()));
        AuthenticatedIdentity {
            identity,
            token: response.id_token,
        }
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
impl IdentityGatewayPort for RestIdentityGateway {
    async fn sign_in_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let response: SignInResponse = self
            .post(
                "accounts:signInWithPassword",
                &json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        info!(uid = %response.local_id, "email sign-in accepted by provider");
        Ok(self.establish_session(response))
    }

    async fn sign_up_email(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let mut body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        if let Some(name) = display_name {
            body["displayName"] = json!(name);
        }
        let mut response: SignInResponse = self.post("accounts:signUp", &body).await?;
        // signUp does not echo the display name consistently.
        if response.display_name.is_none() {
            response.display_name = display_name.map(str::to_string);
        }
        info!(uid = %response.local_id, "email sign-up accepted by provider");
        Ok(self.establish_session(response))
    }

    async fn sign_in_federated(
        &self,
        provider: FederatedProvider,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let credential = self.federated.acquire_credential(provider).await?;
        let response: SignInResponse = self
            .post(
                "accounts:signInWithIdp",
                &json!({
                    "postBody": format!(
                        "id_token={}&providerId={}",
                        credential.id_token,
                        provider.provider_id()
                    ),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        info!(uid = %response.local_id, provider = provider.provider_id(), "federated sign-in accepted by provider");
        Ok(self.establish_session(response))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // Session revocation is client-side for this provider.
        *self.session.write().unwrap() = None;
        self.broadcast(None);
        info!("session cleared");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .post(
                "accounts:sendOobCode",
                &json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email,
                }),
            )
            .await?;
        info!("password reset email requested");
        Ok(())
    }

    async fn current_identity(&self) -> Option<ProviderIdentity> {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|session| session.identity.clone())
    }

    async fn id_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|session| session.id_token.clone())
    }

    async fn subscribe_sessions(&self) -> mpsc::Receiver<SessionChange> {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let current = self.current_identity().await;
        // Initial emission; the receiver is not yet polled, so this cannot fail.
        let _ = tx.try_send(current);
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}
