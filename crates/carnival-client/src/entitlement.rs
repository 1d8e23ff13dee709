//! Subscription flag.
//!
//! Mirrors the per-user entitlement record at `users/{uid}/apps/{namespace}`
//! into a single boolean. A missing record, a missing field or an
//! undecodable record all mean "not premium"; none of them is an error.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use carnival_shared::UserId;
use carnival_store::{DocumentSnapshot, RealtimeStore, Subscription};

use crate::paths::AppPaths;

/// Entitlement record written by the payment system.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub premium_active: bool,
    #[serde(default)]
    pub subscription_status: Option<String>,
    /// Seconds since epoch or an ISO string, depending on the writer.
    #[serde(default)]
    pub premium_current_period_end: Option<serde_json::Value>,
}

impl SubscriptionRecord {
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        match snapshot.decode::<Self>() {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Unreadable entitlement record, treating as not premium");
                Self::default()
            }
        }
    }
}

pub struct SubscriptionFlag {
    store: Arc<dyn RealtimeStore>,
    paths: AppPaths,
    uid: Option<UserId>,
    subscription: Option<Subscription<DocumentSnapshot>>,
    premium: bool,
}

impl SubscriptionFlag {
    pub fn new(store: Arc<dyn RealtimeStore>, paths: AppPaths) -> Self {
        Self {
            store,
            paths,
            uid: None,
            subscription: None,
            premium: false,
        }
    }

    /// Point the flag at `identity`. With no identity there is no
    /// subscription and the flag is `false`.
    pub fn observe(&mut self, identity: Option<&UserId>) {
        if self.uid.as_ref() == identity && (identity.is_none() || self.subscription.is_some()) {
            return;
        }

        self.subscription = None;
        self.premium = false;
        self.uid = identity.cloned();

        let Some(uid) = identity else {
            debug!("No identity, entitlement subscription closed");
            return;
        };

        let subscription = self
            .paths
            .entitlement(uid)
            .and_then(|path| self.store.subscribe(&path));

        match subscription {
            Ok(sub) => {
                debug!(uid = %uid, "Watching entitlement record");
                self.subscription = Some(sub);
            }
            Err(e) => warn!(uid = %uid, error = %e, "Failed to watch entitlement record"),
        }
    }

    pub fn is_premium(&self) -> bool {
        self.premium
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next entitlement snapshot and return the resulting flag.
    /// `None` when there is no live subscription.
    pub async fn next_value(&mut self) -> Option<bool> {
        let sub = self.subscription.as_mut()?;
        match sub.recv().await {
            Some(snapshot) => {
                let record = SubscriptionRecord::from_snapshot(&snapshot);
                if record.premium_active != self.premium {
                    info!(
                        premium = record.premium_active,
                        status = ?record.subscription_status,
                        period_end = ?record.premium_current_period_end,
                        "Entitlement changed"
                    );
                }
                self.premium = record.premium_active;
                Some(self.premium)
            }
            None => {
                warn!("Entitlement subscription closed by store");
                self.subscription = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carnival_store::MemoryStore;
    use serde_json::json;

    fn setup() -> (MemoryStore, SubscriptionFlag, AppPaths) {
        let store = MemoryStore::new();
        let paths = AppPaths::new("carnival-planner-v1");
        let flag = SubscriptionFlag::new(Arc::new(store.clone()), paths.clone());
        (store, flag, paths)
    }

    #[tokio::test]
    async fn absent_identity_is_false_without_subscription() {
        let (_, mut flag, _) = setup();
        flag.observe(None);
        assert!(!flag.is_premium());
        assert!(!flag.is_subscribed());
        assert_eq!(flag.next_value().await, None);
    }

    #[tokio::test]
    async fn missing_record_is_false() {
        let (_, mut flag, _) = setup();
        flag.observe(Some(&UserId::new("u1")));
        assert_eq!(flag.next_value().await, Some(false));
    }

    #[tokio::test]
    async fn record_without_flag_is_false() {
        let (store, mut flag, paths) = setup();
        let uid = UserId::new("u1");
        let path = paths.entitlement(&uid).unwrap();
        store
            .merge_write(&path, json!({ "stripeCustomerId": "cus_1" }).as_object().cloned().unwrap())
            .await
            .unwrap();

        flag.observe(Some(&uid));
        assert_eq!(flag.next_value().await, Some(false));
    }

    #[tokio::test]
    async fn follows_external_activation() {
        let (store, mut flag, paths) = setup();
        let uid = UserId::new("u1");
        flag.observe(Some(&uid));
        assert_eq!(flag.next_value().await, Some(false));

        let path = paths.entitlement(&uid).unwrap();
        store
            .merge_write(
                &path,
                json!({ "premiumActive": true, "subscriptionStatus": "active" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(flag.next_value().await, Some(true));
        assert!(flag.is_premium());

        flag.observe(None);
        assert!(!flag.is_premium());
        assert_eq!(store.subscriber_count(&path).unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_record_is_false() {
        let (store, mut flag, paths) = setup();
        let uid = UserId::new("u1");
        store
            .merge_write(
                &paths.entitlement(&uid).unwrap(),
                json!({ "premiumActive": "yes" }).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        flag.observe(Some(&uid));
        assert_eq!(flag.next_value().await, Some(false));
    }

    #[tokio::test]
    async fn offline_store_leaves_flag_false() {
        let (store, mut flag, _) = setup();
        store.set_offline(true).unwrap();
        flag.observe(Some(&UserId::new("u1")));
        assert!(!flag.is_subscribed());
        assert!(!flag.is_premium());
    }
}
