use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::path::{CollectionPath, DocumentPath};
use crate::snapshot::{CollectionEntry, DocumentSnapshot};
use crate::subscription::Subscription;
use crate::Fields;

/// Contract of the realtime document store.
///
/// - `subscribe` delivers the current state immediately, then one snapshot
///   per change, in an order consistent with this client's write order.
/// - `merge_write` replaces each top-level field named in `patch` and leaves
///   every other field untouched, creating the document if it is absent.
///   Arrays are replaced whole; there is no element-level merge.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    fn subscribe(&self, path: &DocumentPath) -> Result<Subscription<DocumentSnapshot>>;

    fn subscribe_collection(
        &self,
        path: &CollectionPath,
    ) -> Result<Subscription<Vec<CollectionEntry>>>;

    async fn merge_write(&self, path: &DocumentPath, patch: Fields) -> Result<()>;

    /// One-shot read built on `subscribe`: take the first snapshot and
    /// unsubscribe.
    async fn get(&self, path: &DocumentPath) -> Result<DocumentSnapshot> {
        let mut subscription = self.subscribe(path)?;
        subscription.recv().await.ok_or_else(|| {
            StoreError::Unavailable(format!("subscription to {path} closed before first snapshot"))
        })
    }
}
