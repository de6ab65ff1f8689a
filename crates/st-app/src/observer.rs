//! Session observer.
//!
//! One subscription to the identity gateway's session stream for the process
//! lifetime. Every emission, including the initial one, is dispatched to the
//! coordinator's session check; refresh failures are already reflected in
//! coordinator state, so here they are only logged.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use st_core::ports::IdentityGatewayPort;

use crate::coordinator::AuthCoordinator;

pub struct SessionObserver {
    handle: JoinHandle<()>,
}

impl SessionObserver {
    /// Subscribe and start dispatching. The returned handle owns the
    /// subscription; dropping it (or calling [`shutdown`](Self::shutdown))
    /// tears the stream down exactly once.
    pub async fn spawn(
        identity: Arc<dyn IdentityGatewayPort>,
        coordinator: Arc<AuthCoordinator>,
    ) -> Self {
        let mut sessions = identity.subscribe_sessions().await;
        let handle = tokio::spawn(async move {
            while let Some(change) = sessions.recv().await {
                debug!(signed_in = change.is_some(), "session change received");
                if let Err(err) = coordinator.check_auth_state(change).await {
                    warn!(error = %err, "session refresh failed");
                }
            }
            debug!("session stream closed");
        });
        Self { handle }
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Duration, Instant};

    use st_core::auth::{
        AuthError, AuthenticatedIdentity, ProviderIdentity, SessionChange,
    };
    use st_core::FederatedProvider;
    use st_infra::memory::{MemoryAuthCache, MemoryProfileStore};

    /// Gateway whose session stream is fed by the test.
    struct ScriptedGateway {
        tx: StdMutex<Option<mpsc::Sender<SessionChange>>>,
        rx: StdMutex<Option<mpsc::Receiver<SessionChange>>>,
        identity: ProviderIdentity,
    }

    impl ScriptedGateway {
        fn new(identity: ProviderIdentity) -> Self {
            let (tx, rx) = mpsc::channel(8);
            Self {
                tx: StdMutex::new(Some(tx)),
                rx: StdMutex::new(Some(rx)),
                identity,
            }
        }

        fn sender(&self) -> mpsc::Sender<SessionChange> {
            self.tx.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl st_core::ports::IdentityGatewayPort for ScriptedGateway {
        async fn sign_in_email(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<AuthenticatedIdentity, AuthError> {
            unimplemented!("not used by the observer")
        }

        async fn sign_up_email(
            &self,
            _email: &str,
            _password: &str,
            _display_name: Option<&str>,
        ) -> Result<AuthenticatedIdentity, AuthError> {
            unimplemented!("not used by the observer")
        }

        async fn sign_in_federated(
            &self,
            _provider: FederatedProvider,
        ) -> Result<AuthenticatedIdentity, AuthError> {
            unimplemented!("not used by the observer")
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }

        async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn current_identity(&self) -> Option<ProviderIdentity> {
            Some(self.identity.clone())
        }

        async fn id_token(&self) -> Option<String> {
            Some("tok-observer".to_string())
        }

        async fn subscribe_sessions(&self) -> mpsc::Receiver<SessionChange> {
            self.rx.lock().unwrap().take().expect("single subscription")
        }
    }

    fn identity() -> ProviderIdentity {
        ProviderIdentity {
            uid: "uid-obs".to_string(),
            email: "obs@b.com".to_string(),
            display_name: None,
            photo_url: None,
        }
    }

    async fn wait_until(deadline_ms: u64, mut check: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while !check() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn dispatches_every_emission_to_the_coordinator() {
        let gateway = Arc::new(ScriptedGateway::new(identity()));
        let coordinator = Arc::new(AuthCoordinator::new(
            gateway.clone(),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(MemoryAuthCache::new()),
        ));

        let sender = gateway.sender();
        let observer = SessionObserver::spawn(gateway, coordinator.clone()).await;

        sender.send(Some(identity())).await.unwrap();
        wait_until(1_000, || coordinator.state().is_authenticated).await;
        assert_eq!(
            coordinator.state().token.as_deref(),
            Some("tok-observer")
        );

        sender.send(None).await.unwrap();
        wait_until(1_000, || !coordinator.state().is_authenticated).await;
        assert!(coordinator.state().user.is_none());

        observer.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_dispatching() {
        let gateway = Arc::new(ScriptedGateway::new(identity()));
        let coordinator = Arc::new(AuthCoordinator::new(
            gateway.clone(),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(MemoryAuthCache::new()),
        ));

        let sender = gateway.sender();
        let observer = SessionObserver::spawn(gateway, coordinator.clone()).await;
        observer.shutdown();

        // Emissions after teardown are ignored.
        let _ = sender.send(Some(identity())).await;
        sleep(Duration::from_millis(50)).await;
        assert!(!coordinator.state().is_authenticated);
    }
}
