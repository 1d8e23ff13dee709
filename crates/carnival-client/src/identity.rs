//! Identity session.
//!
//! Wraps the external identity provider and exposes the current user as a
//! live value. Sign-in mechanics (OAuth, token refresh, persistence) stay
//! inside the provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use tokio::sync::watch;
use tracing::{error, info};

use carnival_shared::UserId;

use crate::error::AuthError;

/// Boundary to the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<UserId, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Live feed of auth-state changes. Dropping the receiver unsubscribes.
    fn on_state_change(&self) -> watch::Receiver<Option<UserId>>;
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct IdentitySession {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentitySession {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Raw watch handle on the provider's state.
    pub fn watch(&self) -> watch::Receiver<Option<UserId>> {
        self.provider.on_state_change()
    }

    /// Lazy stream of "identity or absent": the current value first, then one
    /// item per auth-state change. Each call starts a fresh subscription.
    pub fn observe(&self) -> impl Stream<Item = Option<UserId>> + Send + 'static {
        let rx = self.provider.on_state_change();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let current = rx.borrow_and_update().clone();
            Some((current, (rx, false)))
        })
    }

    pub fn current(&self) -> Option<UserId> {
        let rx = self.provider.on_state_change();
        let current = rx.borrow().clone();
        current
    }

    pub async fn sign_in(&self) -> Result<UserId, AuthError> {
        match self.provider.sign_in().await {
            Ok(uid) => {
                info!(uid = %uid, "Signed in");
                Ok(uid)
            }
            Err(e) => {
                error!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await.map_err(|e| {
            error!(error = %e, "Sign-out failed");
            e
        })?;
        info!("Signed out");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local provider
// ---------------------------------------------------------------------------

/// Provider that signs a fixed user in and out without any network.
///
/// Backs demo mode and tests. `set_reject_sign_in(true)` makes the next
/// sign-in attempts fail the way a dismissed OAuth popup would.
pub struct LocalIdentityProvider {
    uid: UserId,
    state: watch::Sender<Option<UserId>>,
    reject_sign_in: AtomicBool,
}

impl LocalIdentityProvider {
    /// Starts signed out.
    pub fn new(uid: UserId) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            uid,
            state,
            reject_sign_in: AtomicBool::new(false),
        }
    }

    /// Starts signed in as `uid`.
    pub fn signed_in(uid: UserId) -> Self {
        let provider = Self::new(uid.clone());
        provider.state.send_replace(Some(uid));
        provider
    }

    pub fn set_reject_sign_in(&self, reject: bool) {
        self.reject_sign_in.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self) -> Result<UserId, AuthError> {
        if self.reject_sign_in.load(Ordering::SeqCst) {
            return Err(AuthError::SignInFailed("popup closed by user".into()));
        }
        self.state.send_replace(Some(self.uid.clone()));
        Ok(self.uid.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_replace(None);
        Ok(())
    }

    fn on_state_change(&self) -> watch::Receiver<Option<UserId>> {
        self.state.subscribe()
    }
}
