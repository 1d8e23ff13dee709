//! Checkout initiator.
//!
//! Obtains a hosted-checkout redirect URL for a plan tier and navigates to it.
//! Never touches the subscription flag; the payment system updates the
//! entitlement record and the live subscription picks it up.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use carnival_shared::{PlanTier, UserId};

use crate::config::ClientConfig;
use crate::error::CheckoutError;

/// Payload of the `createCheckoutSession` callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    #[serde(rename = "priceId")]
    pub price_id: String,
    pub uid: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSession")]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: Option<String>,
}

/// Older callables answer `url`, newer ones `checkoutUrl`, some both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    #[serde(default)]
    checkout_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

impl From<RawSession> for CheckoutSession {
    fn from(raw: RawSession) -> Self {
        Self {
            checkout_url: raw.checkout_url.or(raw.url).unwrap_or_default(),
            session_id: raw.session_id,
        }
    }
}

/// Boundary to the hosted checkout callable.
#[async_trait]
pub trait CheckoutCallable: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError>;
}

/// Where the redirect URL goes. In a browser this would be `location`.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> Result<(), CheckoutError>;
}

/// Navigator that only logs the target URL.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, url: &str) -> Result<(), CheckoutError> {
        info!(url, "Open this URL to complete checkout");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP callable
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CallableBody<'a> {
    data: &'a CheckoutRequest,
}

#[derive(Deserialize)]
struct CallableResponse {
    #[serde(default)]
    result: Option<CheckoutSession>,
    #[serde(default)]
    error: Option<CallableFault>,
}

#[derive(Deserialize)]
struct CallableFault {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Callable invoked over the cloud-functions HTTPS protocol:
/// `POST {"data": ...}`, answered by `{"result": ...}` or `{"error": ...}`.
pub struct HttpCheckoutCallable {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCheckoutCallable {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CheckoutCallable for HttpCheckoutCallable {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        debug!(endpoint = %self.endpoint, price_id = %request.price_id, "Invoking checkout callable");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&CallableBody { data: request })
            .send()
            .await?;

        let status = resp.status();
        let body: CallableResponse = resp.json().await?;

        if let Some(fault) = body.error {
            let status = fault.status.unwrap_or_else(|| status.to_string());
            return Err(CheckoutError::Service(format!("{status}: {}", fault.message)));
        }
        if !status.is_success() {
            return Err(CheckoutError::Service(format!("callable answered {status}")));
        }

        body.result.ok_or(CheckoutError::MissingUrl)
    }
}

// ---------------------------------------------------------------------------
// Initiator
// ---------------------------------------------------------------------------

pub struct CheckoutInitiator {
    callable: Arc<dyn CheckoutCallable>,
    navigator: Arc<dyn Navigator>,
    config: Arc<ClientConfig>,
}

impl CheckoutInitiator {
    pub fn new(
        callable: Arc<dyn CheckoutCallable>,
        navigator: Arc<dyn Navigator>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            callable,
            navigator,
            config,
        }
    }

    pub fn request_for(&self, uid: &UserId, tier: PlanTier) -> CheckoutRequest {
        CheckoutRequest {
            price_id: self.config.price_id(tier).to_string(),
            uid: uid.to_string(),
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
        }
    }

    /// Start hosted checkout for `tier` and navigate to the returned URL.
    ///
    /// Without an identity nothing is sent and `SignInRequired` is returned.
    pub async fn start_checkout(
        &self,
        identity: Option<&UserId>,
        tier: PlanTier,
    ) -> Result<String, CheckoutError> {
        let Some(uid) = identity else {
            info!(%tier, "Checkout requested while signed out");
            return Err(CheckoutError::SignInRequired);
        };

        let request = self.request_for(uid, tier);
        let session = self
            .callable
            .create_checkout_session(&request)
            .await
            .map_err(|e| {
                error!(uid = %uid, %tier, error = %e, "Checkout session failed");
                e
            })?;

        if session.checkout_url.is_empty() {
            error!(uid = %uid, %tier, "Checkout session has no URL");
            return Err(CheckoutError::MissingUrl);
        }

        info!(uid = %uid, %tier, session_id = ?session.session_id, "Redirecting to checkout");
        self.navigator.navigate(&session.checkout_url)?;
        Ok(session.checkout_url)
    }
}
