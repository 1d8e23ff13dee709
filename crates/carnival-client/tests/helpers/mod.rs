use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use carnival_client::checkout::{
    CheckoutCallable, CheckoutInitiator, CheckoutRequest, CheckoutSession, Navigator,
};
use carnival_client::identity::{IdentitySession, LocalIdentityProvider};
use carnival_client::paths::AppPaths;
use carnival_client::{
    spawn_session, CheckoutError, ClientConfig, SessionCommand, SessionContext, SessionHandle,
    SessionNotification,
};
use carnival_shared::{FestivalId, PlanDocument, UserId};
use carnival_store::MemoryStore;

pub const TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default)]
pub struct RecordingCallable {
    pub requests: Mutex<Vec<CheckoutRequest>>,
}

#[async_trait]
impl CheckoutCallable for RecordingCallable {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.test/{}", request.price_id),
            session_id: Some("cs_test".to_owned()),
        })
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) -> Result<(), CheckoutError> {
        self.visited.lock().unwrap().push(url.to_owned());
        Ok(())
    }
}

pub struct TestSession {
    pub store: MemoryStore,
    pub paths: AppPaths,
    pub provider: Arc<LocalIdentityProvider>,
    pub callable: Arc<RecordingCallable>,
    pub navigator: Arc<RecordingNavigator>,
    pub handle: SessionHandle,
}

/// Session for `uid`, initially signed out.
pub fn setup_session(uid: &str) -> TestSession {
    let config = Arc::new(ClientConfig::default());
    let store = MemoryStore::new();
    let provider = Arc::new(LocalIdentityProvider::new(UserId::new(uid)));
    let callable = Arc::new(RecordingCallable::default());
    let navigator = Arc::new(RecordingNavigator::default());

    let handle = spawn_session(SessionContext {
        identity: IdentitySession::new(provider.clone()),
        store: Arc::new(store.clone()),
        checkout: Arc::new(CheckoutInitiator::new(
            callable.clone(),
            navigator.clone(),
            config.clone(),
        )),
        config: config.clone(),
    });

    TestSession {
        store,
        paths: AppPaths::new(config.app_namespace.clone()),
        provider,
        callable,
        navigator,
        handle,
    }
}

/// Skip notifications until one matches.
pub async fn wait_for(
    handle: &mut SessionHandle,
    mut pred: impl FnMut(&SessionNotification) -> bool,
) -> anyhow::Result<SessionNotification> {
    let found = tokio::time::timeout(TIMEOUT, async {
        while let Some(n) = handle.next_notification().await {
            if pred(&n) {
                return Some(n);
            }
        }
        None
    })
    .await?;

    found.ok_or_else(|| anyhow::anyhow!("session stopped before notification arrived"))
}

/// Wait for a snapshot of `festival` that satisfies `pred`.
pub async fn wait_for_plan(
    handle: &mut SessionHandle,
    festival: &str,
    pred: impl Fn(&PlanDocument) -> bool,
) -> anyhow::Result<PlanDocument> {
    let n = wait_for(handle, |n| match n {
        SessionNotification::PlanUpdated {
            festival: f,
            plan: Some(plan),
        } => f.as_str() == festival && pred(plan),
        _ => false,
    })
    .await?;

    match n {
        SessionNotification::PlanUpdated {
            plan: Some(plan), ..
        } => Ok(plan),
        other => anyhow::bail!("unexpected notification {other:?}"),
    }
}

/// Sign in, select `festival` and wait until its plan has loaded.
#[allow(dead_code)]
pub async fn sign_in_and_select(ts: &mut TestSession, festival: &str) -> anyhow::Result<PlanDocument> {
    ts.handle.send(SessionCommand::SignIn).await?;
    ts.handle
        .send(SessionCommand::Select {
            festival: FestivalId::new(festival),
        })
        .await?;
    wait_for_plan(&mut ts.handle, festival, |_| true).await
}
