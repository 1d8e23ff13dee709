//! In-process realtime store.
//!
//! Holds documents in a `BTreeMap` keyed by path and pushes snapshots to
//! subscribers synchronously inside `merge_write`, so a writer's own
//! subscription always observes its writes in order. Used for demo mode
//! and as the store double in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};
use crate::path::{CollectionPath, DocumentPath};
use crate::snapshot::{CollectionEntry, DocumentSnapshot};
use crate::store::RealtimeStore;
use crate::subscription::Subscription;
use crate::Fields;

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct Watcher<T> {
    id: u64,
    tx: mpsc::UnboundedSender<T>,
}

#[derive(Default)]
struct Inner {
    documents: BTreeMap<DocumentPath, Fields>,
    doc_watchers: HashMap<DocumentPath, Vec<Watcher<DocumentSnapshot>>>,
    collection_watchers: HashMap<CollectionPath, Vec<Watcher<Vec<CollectionEntry>>>>,
    next_watcher_id: u64,
    offline: bool,
    writes: u64,
}

impl Inner {
    fn snapshot(&self, path: &DocumentPath) -> DocumentSnapshot {
        match self.documents.get(path) {
            Some(fields) => DocumentSnapshot::Present(fields.clone()),
            None => DocumentSnapshot::Missing,
        }
    }

    fn listing(&self, collection: &CollectionPath) -> Vec<CollectionEntry> {
        self.documents
            .iter()
            .filter(|(path, _)| collection.contains(path))
            .map(|(path, data)| CollectionEntry {
                id: path.id().to_string(),
                data: data.clone(),
            })
            .collect()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_watcher_id += 1;
        self.next_watcher_id
    }

    fn ensure_online(&self, op: &str, path: &dyn std::fmt::Display) -> Result<()> {
        if self.offline {
            return Err(StoreError::Unavailable(format!("{op} {path}: store is offline")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Shared, cloneable in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Simulate loss of connectivity: writes and new subscriptions fail with
    /// [`StoreError::Unavailable`] until switched back.
    pub fn set_offline(&self, offline: bool) -> Result<()> {
        self.lock()?.offline = offline;
        debug!(offline, "memory store connectivity changed");
        Ok(())
    }

    /// Current fields of a document, if it exists.
    pub fn document(&self, path: &DocumentPath) -> Result<Option<Fields>> {
        Ok(self.lock()?.documents.get(path).cloned())
    }

    /// Total successful writes since creation.
    pub fn write_count(&self) -> Result<u64> {
        Ok(self.lock()?.writes)
    }

    /// Number of live subscriptions on a document.
    pub fn subscriber_count(&self, path: &DocumentPath) -> Result<usize> {
        Ok(self
            .lock()?
            .doc_watchers
            .get(path)
            .map(Vec::len)
            .unwrap_or(0))
    }

    fn apply_merge(&self, path: &DocumentPath, patch: Fields) -> Result<()> {
        let mut inner = self.lock()?;
        inner.ensure_online("write", path)?;

        let doc = inner.documents.entry(path.clone()).or_default();
        for (key, value) in patch {
            doc.insert(key, value);
        }
        inner.writes += 1;

        let snapshot = inner.snapshot(path);
        if let Some(watchers) = inner.doc_watchers.get_mut(path) {
            watchers.retain(|w| w.tx.send(snapshot.clone()).is_ok());
        }

        let collection = path.parent();
        let listing = inner.listing(&collection);
        if let Some(watchers) = inner.collection_watchers.get_mut(&collection) {
            watchers.retain(|w| w.tx.send(listing.clone()).is_ok());
        }

        trace!(path = %path, "merge write applied");
        Ok(())
    }
}

fn remove_doc_watcher(inner: &Weak<Mutex<Inner>>, path: &DocumentPath, id: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Ok(mut guard) = inner.lock() else {
        return;
    };
    if let Some(watchers) = guard.doc_watchers.get_mut(path) {
        watchers.retain(|w| w.id != id);
        if watchers.is_empty() {
            guard.doc_watchers.remove(path);
        }
    }
}

fn remove_collection_watcher(inner: &Weak<Mutex<Inner>>, path: &CollectionPath, id: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Ok(mut guard) = inner.lock() else {
        return;
    };
    if let Some(watchers) = guard.collection_watchers.get_mut(path) {
        watchers.retain(|w| w.id != id);
        if watchers.is_empty() {
            guard.collection_watchers.remove(path);
        }
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    fn subscribe(&self, path: &DocumentPath) -> Result<Subscription<DocumentSnapshot>> {
        let mut inner = self.lock()?;
        inner.ensure_online("subscribe", path)?;

        let (tx, rx) = mpsc::unbounded_channel();
        // Initial snapshot; the receiver is alive so this cannot fail.
        let _ = tx.send(inner.snapshot(path));

        let id = inner.allocate_id();
        inner
            .doc_watchers
            .entry(path.clone())
            .or_default()
            .push(Watcher { id, tx });

        debug!(path = %path, id, "document subscription opened");

        let weak = Arc::downgrade(&self.inner);
        let path = path.clone();
        Ok(Subscription::new(rx, move || {
            remove_doc_watcher(&weak, &path, id);
            debug!(path = %path, id, "document subscription closed");
        }))
    }

    fn subscribe_collection(
        &self,
        path: &CollectionPath,
    ) -> Result<Subscription<Vec<CollectionEntry>>> {
        let mut inner = self.lock()?;
        inner.ensure_online("subscribe", path)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(inner.listing(path));

        let id = inner.allocate_id();
        inner
            .collection_watchers
            .entry(path.clone())
            .or_default()
            .push(Watcher { id, tx });

        debug!(path = %path, id, "collection subscription opened");

        let weak = Arc::downgrade(&self.inner);
        let path = path.clone();
        Ok(Subscription::new(rx, move || {
            remove_collection_watcher(&weak, &path, id);
        }))
    }

    async fn merge_write(&self, path: &DocumentPath, patch: Fields) -> Result<()> {
        self.apply_merge(path, patch)
    }
}
