//! # carnival-store
//!
//! Boundary to the realtime document store.
//!
//! The store is consumed through three primitives: subscribe to a document,
//! subscribe to a collection, and merge-write a document. [`RealtimeStore`]
//! captures that contract; [`MemoryStore`] is an in-process implementation
//! used for demo mode and tests.

pub mod memory;
pub mod path;
pub mod snapshot;
pub mod store;
pub mod subscription;

mod error;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocumentPath};
pub use snapshot::{CollectionEntry, DocumentSnapshot};
pub use store::RealtimeStore;
pub use subscription::Subscription;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;
