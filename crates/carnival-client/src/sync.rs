//! Plan document sync.
//!
//! For the active (user, festival) key, keeps one live subscription on the
//! plan document and mirrors the last decoded snapshot. All writes to the
//! three sub-lists go through [`PlanSync::upsert_field`], which merge-writes
//! one whole array.
//!
//! Concurrency contract: an edit reads the last snapshot received by this
//! client, transforms it locally and writes the whole array back. Edits from
//! one session are serialized by the session loop; edits from other tabs or
//! devices to the same list are last-write-wins at array granularity.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info, warn};

use carnival_shared::{BudgetItem, FestivalId, PackingItem, PlanDocument, PlanField, ScheduleItem, UserId};
use carnival_store::{DocumentPath, DocumentSnapshot, Fields, RealtimeStore, Subscription};

use crate::error::SyncError;
use crate::paths::AppPaths;

/// A write that has been issued but not awaited. Callers may await it to
/// observe failure, or hand it to the session loop.
pub type PendingWrite = BoxFuture<'static, Result<(), SyncError>>;

/// Encode a value as the top-level fields of a document.
pub fn document_fields<T: Serialize>(value: &T) -> Result<Fields, SyncError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(SyncError::NotAnObject),
    }
}

/// Plan snapshot decoded at the sync boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanSnapshot {
    Missing,
    Present(PlanDocument),
}

impl PlanSnapshot {
    pub fn document(&self) -> Option<&PlanDocument> {
        match self {
            Self::Present(doc) => Some(doc),
            Self::Missing => None,
        }
    }
}

/// Identifies one plan document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub uid: UserId,
    pub festival: FestivalId,
}

/// Replacement value for one sub-list.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Budget(Vec<BudgetItem>),
    Schedule(Vec<ScheduleItem>),
    Packing(Vec<PackingItem>),
}

impl FieldUpdate {
    pub fn field(&self) -> PlanField {
        match self {
            Self::Budget(_) => PlanField::Budget,
            Self::Schedule(_) => PlanField::Schedule,
            Self::Packing(_) => PlanField::Packing,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Budget(items) => items.len(),
            Self::Schedule(items) => items.len(),
            Self::Packing(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_patch(self) -> Result<Fields, SyncError> {
        let field = self.field();
        let value = match self {
            Self::Budget(items) => serde_json::to_value(items)?,
            Self::Schedule(items) => serde_json::to_value(items)?,
            Self::Packing(items) => serde_json::to_value(items)?,
        };
        let mut patch = Fields::new();
        patch.insert(field.as_str().to_string(), value);
        Ok(patch)
    }
}

pub struct PlanSync {
    store: Arc<dyn RealtimeStore>,
    paths: AppPaths,
    key: Option<PlanKey>,
    path: Option<DocumentPath>,
    subscription: Option<Subscription<DocumentSnapshot>>,
    latest: Option<PlanSnapshot>,
}

impl PlanSync {
    pub fn new(store: Arc<dyn RealtimeStore>, paths: AppPaths) -> Self {
        Self {
            store,
            paths,
            key: None,
            path: None,
            subscription: None,
            latest: None,
        }
    }

    /// Follow the plan for `(identity, active)`.
    ///
    /// A changed key drops the previous subscription, which discards any
    /// snapshot of the old plan not yet consumed, and clears the mirror.
    /// Either half absent means no subscription. Returns `true` if the key
    /// changed.
    pub fn observe(&mut self, identity: Option<&UserId>, active: Option<&FestivalId>) -> bool {
        let key = match (identity, active) {
            (Some(uid), Some(festival)) => Some(PlanKey {
                uid: uid.clone(),
                festival: festival.clone(),
            }),
            _ => None,
        };

        if key == self.key && (key.is_none() || self.subscription.is_some()) {
            return false;
        }

        let changed = key != self.key;
        self.subscription = None;
        self.latest = None;
        self.path = None;
        self.key = key;

        let Some(key) = self.key.as_ref() else {
            debug!("Plan sync idle");
            return changed;
        };

        let path = match self.paths.plan(&key.uid, &key.festival) {
            Ok(path) => path,
            Err(e) => {
                warn!(festival = %key.festival, error = %e, "Invalid plan path");
                return changed;
            }
        };

        match self.store.subscribe(&path) {
            Ok(sub) => {
                info!(path = %path, "Watching plan document");
                self.subscription = Some(sub);
            }
            Err(e) => warn!(path = %path, error = %e, "Failed to watch plan document"),
        }
        self.path = Some(path);

        changed
    }

    pub fn key(&self) -> Option<&PlanKey> {
        self.key.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Last snapshot received for the current key.
    pub fn snapshot(&self) -> Option<&PlanSnapshot> {
        self.latest.as_ref()
    }

    /// Last known good document for the current key.
    pub fn current(&self) -> Option<&PlanDocument> {
        self.latest.as_ref().and_then(PlanSnapshot::document)
    }

    /// Wait for the next snapshot of the current plan, decode it and make it
    /// the mirror. Undecodable snapshots are logged and skipped so the mirror
    /// keeps the last good state. `None` when there is no live subscription.
    pub async fn next_snapshot(&mut self) -> Option<PlanSnapshot> {
        loop {
            let sub = self.subscription.as_mut()?;
            let Some(raw) = sub.recv().await else {
                warn!("Plan subscription closed by store");
                self.subscription = None;
                return None;
            };
            if let Some(snapshot) = self.apply(raw) {
                return Some(snapshot);
            }
        }
    }

    /// Apply every snapshot already delivered, without waiting. Returns the
    /// newest one applied.
    pub fn drain_ready(&mut self) -> Option<PlanSnapshot> {
        let mut newest = None;
        while let Some(raw) = self.subscription.as_mut().and_then(|sub| sub.try_recv()) {
            if let Some(snapshot) = self.apply(raw) {
                newest = Some(snapshot);
            }
        }
        newest
    }

    fn apply(&mut self, raw: DocumentSnapshot) -> Option<PlanSnapshot> {
        let snapshot = match raw.decode::<PlanDocument>() {
            Ok(Some(doc)) => PlanSnapshot::Present(doc),
            Ok(None) => PlanSnapshot::Missing,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed plan snapshot");
                return None;
            }
        };

        debug!(exists = snapshot.document().is_some(), "Plan snapshot applied");
        self.latest = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Merge-write `{ field: newArray }` to the current plan document.
    ///
    /// The array replaces the remote one whole. Derive it from
    /// [`PlanSync::current`] or concurrent edits already received will be
    /// lost.
    pub fn upsert_field(&self, update: FieldUpdate) -> Result<PendingWrite, SyncError> {
        let path = self.path.clone().ok_or(SyncError::NoActivePlan)?;
        let field = update.field();
        let len = update.len();
        let patch = update.into_patch()?;
        let store = self.store.clone();

        debug!(path = %path, %field, len, "Writing plan field");

        let write: PendingWrite = Box::pin(async move {
            store.merge_write(&path, patch).await.map_err(|e| {
                warn!(path = %path, %field, error = %e, "Plan field write failed");
                SyncError::from(e)
            })
        });
        Ok(write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carnival_shared::ItemId;
    use carnival_store::MemoryStore;
    use chrono::Utc;
    use serde_json::json;

    fn setup() -> (MemoryStore, PlanSync, AppPaths) {
        let store = MemoryStore::new();
        let paths = AppPaths::new("carnival-planner-v1");
        let sync = PlanSync::new(Arc::new(store.clone()), paths.clone());
        (store, sync, paths)
    }

    async fn create_plan(store: &MemoryStore, path: &DocumentPath, name: &str) {
        let doc = serde_json::to_value(PlanDocument::new(name, Utc::now())).unwrap();
        store
            .merge_write(path, doc.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    fn budget(name: &str, cost: f64) -> BudgetItem {
        BudgetItem {
            id: ItemId::generate(),
            name: name.into(),
            cost,
        }
    }

    #[tokio::test]
    async fn no_subscription_without_identity_or_plan() {
        let (_, mut sync, _) = setup();
        sync.observe(None, Some(&FestivalId::new("trinidad")));
        assert!(!sync.is_subscribed());
        sync.observe(Some(&UserId::new("u1")), None);
        assert!(!sync.is_subscribed());
        assert!(matches!(
            sync.upsert_field(FieldUpdate::Budget(Vec::new())),
            Err(SyncError::NoActivePlan)
        ));
    }

    #[tokio::test]
    async fn mirrors_remote_document() {
        let (store, mut sync, paths) = setup();
        let uid = UserId::new("u1");
        let festival = FestivalId::new("trinidad");
        let path = paths.plan(&uid, &festival).unwrap();

        assert!(sync.observe(Some(&uid), Some(&festival)));
        assert_eq!(sync.next_snapshot().await, Some(PlanSnapshot::Missing));

        create_plan(&store, &path, "Trinidad Carnival - February").await;
        let snap = sync.next_snapshot().await.unwrap();
        assert_eq!(snap.document().unwrap().name, "Trinidad Carnival - February");
        assert_eq!(sync.current().unwrap().name, "Trinidad Carnival - February");
    }

    #[tokio::test]
    async fn upsert_replaces_only_its_field() {
        let (store, mut sync, paths) = setup();
        let uid = UserId::new("u1");
        let festival = FestivalId::new("trinidad");
        let path = paths.plan(&uid, &festival).unwrap();
        create_plan(&store, &path, "Trinidad Carnival - February").await;

        sync.observe(Some(&uid), Some(&festival));
        sync.next_snapshot().await;

        sync.upsert_field(FieldUpdate::Packing(vec![PackingItem {
            id: ItemId::from("p1"),
            item: "Sunblock".into(),
            checked: false,
        }]))
        .unwrap()
        .await
        .unwrap();
        sync.upsert_field(FieldUpdate::Budget(vec![budget("Costume", 250.0)]))
            .unwrap()
            .await
            .unwrap();

        sync.next_snapshot().await;
        let doc = sync.next_snapshot().await.unwrap();
        let doc = doc.document().unwrap();
        assert_eq!(doc.packing.len(), 1);
        assert_eq!(doc.budget.len(), 1);
        assert!(doc.schedule.is_empty());
        assert_eq!(doc.name, "Trinidad Carnival - February");
    }

    #[tokio::test]
    async fn switching_plans_drops_old_snapshots() {
        let (store, mut sync, paths) = setup();
        let uid = UserId::new("u1");
        let a = FestivalId::new("trinidad");
        let b = FestivalId::new("barbados");
        let path_a = paths.plan(&uid, &a).unwrap();
        let path_b = paths.plan(&uid, &b).unwrap();
        create_plan(&store, &path_a, "A").await;
        create_plan(&store, &path_b, "B").await;

        sync.observe(Some(&uid), Some(&a));
        // Queue a snapshot for A that is never consumed.
        store
            .merge_write(&path_a, json!({ "name": "A2" }).as_object().cloned().unwrap())
            .await
            .unwrap();

        sync.observe(Some(&uid), Some(&b));
        assert_eq!(store.subscriber_count(&path_a).unwrap(), 0);
        assert!(sync.current().is_none());

        store
            .merge_write(&path_a, json!({ "name": "A3" }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let snap = sync.next_snapshot().await.unwrap();
        assert_eq!(snap.document().unwrap().name, "B");
        assert_eq!(sync.key().unwrap().festival, b);
    }

    #[tokio::test]
    async fn malformed_snapshot_keeps_last_good_state() {
        let (store, mut sync, paths) = setup();
        let uid = UserId::new("u1");
        let festival = FestivalId::new("trinidad");
        let path = paths.plan(&uid, &festival).unwrap();
        create_plan(&store, &path, "T").await;

        sync.observe(Some(&uid), Some(&festival));
        sync.next_snapshot().await;

        store
            .merge_write(&path, json!({ "budget": "oops" }).as_object().cloned().unwrap())
            .await
            .unwrap();
        store
            .merge_write(&path, json!({ "budget": [] , "name": "T2" }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let snap = sync.next_snapshot().await.unwrap();
        assert_eq!(snap.document().unwrap().name, "T2");
    }

    #[test]
    fn document_fields_rejects_non_objects() {
        let fields = document_fields(&PlanDocument::new("T", Utc::now())).unwrap();
        assert_eq!(fields["name"], json!("T"));
        assert!(matches!(document_fields(&vec![1, 2]), Err(SyncError::NotAnObject)));
        assert!(matches!(document_fields(&"plan"), Err(SyncError::NotAnObject)));
    }

    #[tokio::test]
    async fn drain_applies_delivered_snapshots_without_waiting() {
        let (store, mut sync, paths) = setup();
        let uid = UserId::new("u1");
        let festival = FestivalId::new("trinidad");
        let path = paths.plan(&uid, &festival).unwrap();

        sync.observe(Some(&uid), Some(&festival));
        create_plan(&store, &path, "T").await;

        let snap = sync.drain_ready().unwrap();
        assert_eq!(snap.document().unwrap().name, "T");
        assert_eq!(sync.current().unwrap().name, "T");
        assert!(sync.drain_ready().is_none());
    }

    #[tokio::test]
    async fn failed_write_reported_to_caller() {
        let (store, mut sync, _) = setup();
        sync.observe(Some(&UserId::new("u1")), Some(&FestivalId::new("trinidad")));
        sync.next_snapshot().await;

        store.set_offline(true).unwrap();
        let err = sync
            .upsert_field(FieldUpdate::Budget(vec![budget("Flight", 850.0)]))
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
    }
}
