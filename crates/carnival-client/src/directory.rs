//! Saved plan directory: the list of plans the signed-in user has created.

use std::sync::Arc;

use tracing::{debug, warn};

use carnival_shared::{catalog, FestivalId, UserId};
use carnival_store::{CollectionEntry, CollectionPath, RealtimeStore, Subscription};

use crate::paths::AppPaths;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlan {
    pub festival_id: FestivalId,
    pub name: String,
}

impl SavedPlan {
    /// A document without a string `name` falls back to the catalog name,
    /// then to the raw id.
    fn from_entry(entry: &CollectionEntry) -> Self {
        let festival_id = FestivalId::new(entry.id.clone());
        let name = match entry.data.get("name").and_then(|v| v.as_str()) {
            Some(name) => name.to_string(),
            None => {
                warn!(festival = %festival_id, "Saved plan has no name");
                catalog::find(&entry.id)
                    .map(|c| c.display_name())
                    .unwrap_or_else(|| entry.id.clone())
            }
        };
        Self { festival_id, name }
    }
}

pub struct PlanDirectory {
    store: Arc<dyn RealtimeStore>,
    paths: AppPaths,
    uid: Option<UserId>,
    subscription: Option<Subscription<Vec<CollectionEntry>>>,
    plans: Vec<SavedPlan>,
}

impl PlanDirectory {
    pub fn new(store: Arc<dyn RealtimeStore>, paths: AppPaths) -> Self {
        Self {
            store,
            paths,
            uid: None,
            subscription: None,
            plans: Vec::new(),
        }
    }

    pub fn observe(&mut self, identity: Option<&UserId>) {
        if self.uid.as_ref() == identity && (identity.is_none() || self.subscription.is_some()) {
            return;
        }

        self.subscription = None;
        self.plans.clear();
        self.uid = identity.cloned();

        let Some(uid) = identity else {
            return;
        };

        let subscription = self
            .paths
            .plans(uid)
            .and_then(|path: CollectionPath| self.store.subscribe_collection(&path));
        match subscription {
            Ok(sub) => self.subscription = Some(sub),
            Err(e) => warn!(uid = %uid, error = %e, "Failed to watch saved plans"),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn plans(&self) -> &[SavedPlan] {
        &self.plans
    }

    pub async fn next_listing(&mut self) -> Option<Vec<SavedPlan>> {
        let sub = self.subscription.as_mut()?;
        let Some(entries) = sub.recv().await else {
            self.subscription = None;
            return None;
        };

        self.plans = entries.iter().map(SavedPlan::from_entry).collect();
        debug!(count = self.plans.len(), "Saved plans updated");
        Some(self.plans.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carnival_store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn lists_saved_plans_for_user() {
        let store = MemoryStore::new();
        let paths = AppPaths::new("carnival-planner-v1");
        let mut directory = PlanDirectory::new(Arc::new(store.clone()), paths.clone());
        let uid = UserId::new("u1");

        directory.observe(Some(&uid));
        assert_eq!(directory.next_listing().await, Some(Vec::new()));

        let path = paths.plan(&uid, &FestivalId::new("rio")).unwrap();
        store
            .merge_write(&path, json!({ "name": "Rio Carnival - February" }).as_object().cloned().unwrap())
            .await
            .unwrap();
        let path = paths.plan(&uid, &FestivalId::new("trinidad")).unwrap();
        store
            .merge_write(&path, json!({ "budget": [] }).as_object().cloned().unwrap())
            .await
            .unwrap();

        directory.next_listing().await;
        let plans = directory.next_listing().await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].name, "Rio Carnival - February");
        assert_eq!(plans[1].name, "Trinidad Carnival - February");
    }

    #[tokio::test]
    async fn sign_out_clears_listing() {
        let store = MemoryStore::new();
        let paths = AppPaths::new("carnival-planner-v1");
        let mut directory = PlanDirectory::new(Arc::new(store), paths);

        directory.observe(Some(&UserId::new("u1")));
        assert!(directory.is_subscribed());
        directory.observe(None);
        assert!(!directory.is_subscribed());
        assert!(directory.plans().is_empty());
        assert_eq!(directory.next_listing().await, None);
    }
}
