//! Store locations of this application's records.
//!
//! ```text
//! users/{uid}/apps/{namespace}                        entitlement record
//! users/{uid}/apps/{namespace}/carnivals              saved plans
//! users/{uid}/apps/{namespace}/carnivals/{festival}   plan document
//! ```

use carnival_shared::constants::PLANS_COLLECTION;
use carnival_shared::{FestivalId, UserId};
use carnival_store::{CollectionPath, DocumentPath, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    namespace: String,
}

impl AppPaths {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entitlement(&self, uid: &UserId) -> Result<DocumentPath> {
        DocumentPath::from_segments(["users", uid.as_str(), "apps", self.namespace.as_str()])
    }

    pub fn plans(&self, uid: &UserId) -> Result<CollectionPath> {
        self.entitlement(uid)?.collection(PLANS_COLLECTION)
    }

    pub fn plan(&self, uid: &UserId, festival: &FestivalId) -> Result<DocumentPath> {
        self.plans(uid)?.doc(festival.as_str())
    }
}
