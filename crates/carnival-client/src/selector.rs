//! Active plan selection and lazy plan initialization.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use carnival_shared::{catalog, DomainError, FestivalId, PlanDocument, UserId};
use carnival_store::{DocumentPath, RealtimeStore};

use crate::error::SyncError;
use crate::paths::AppPaths;
use crate::sync::document_fields;

/// Result of selecting a plan or re-checking its initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The plan document did not exist and was written with empty lists.
    Created,
    AlreadyInitialized,
    /// No identity; initialization runs once someone signs in.
    Deferred,
    /// The existence check or the initial write failed. Logged only.
    InitFailed,
}

pub struct ActivePlanSelector {
    store: Arc<dyn RealtimeStore>,
    paths: AppPaths,
    active: Option<FestivalId>,
    initialized: HashSet<DocumentPath>,
}

impl ActivePlanSelector {
    pub fn new(store: Arc<dyn RealtimeStore>, paths: AppPaths) -> Self {
        Self {
            store,
            paths,
            active: None,
            initialized: HashSet::new(),
        }
    }

    pub fn active(&self) -> Option<&FestivalId> {
        self.active.as_ref()
    }

    /// Make `festival` the active plan, creating its document when missing.
    ///
    /// The active id changes even without an identity. Unknown ids are
    /// rejected and leave the previous selection in place.
    pub async fn select(
        &mut self,
        identity: Option<&UserId>,
        festival: &FestivalId,
    ) -> Result<SelectOutcome, DomainError> {
        catalog::lookup(festival)?;

        if self.active.as_ref() != Some(festival) {
            info!(festival = %festival, "Active plan changed");
        }
        self.active = Some(festival.clone());

        let Some(uid) = identity else {
            debug!(festival = %festival, "No identity, deferring plan initialization");
            return Ok(SelectOutcome::Deferred);
        };
        Ok(self.ensure_initialized(uid).await)
    }

    /// Create the active plan's document for `uid` if it does not exist.
    ///
    /// Existing documents are never rewritten, so repeated calls do not
    /// overwrite lists. Failures are logged and reported as
    /// [`SelectOutcome::InitFailed`].
    pub async fn ensure_initialized(&mut self, uid: &UserId) -> SelectOutcome {
        let Some(festival) = self.active.clone() else {
            return SelectOutcome::Deferred;
        };

        match self.try_initialize(uid, &festival).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(festival = %festival, error = %e, "Plan initialization failed");
                SelectOutcome::InitFailed
            }
        }
    }

    async fn try_initialize(
        &mut self,
        uid: &UserId,
        festival: &FestivalId,
    ) -> Result<SelectOutcome, SyncError> {
        let path = self.paths.plan(uid, festival)?;
        if self.initialized.contains(&path) {
            return Ok(SelectOutcome::AlreadyInitialized);
        }

        if self.store.get(&path).await?.exists() {
            self.initialized.insert(path);
            return Ok(SelectOutcome::AlreadyInitialized);
        }

        let name = catalog::lookup(festival)
            .map(|entry| entry.display_name())
            .unwrap_or_else(|_| festival.to_string());
        let doc = PlanDocument::new(name, Utc::now());
        let fields = document_fields(&doc)?;

        self.store.merge_write(&path, fields).await?;
        info!(path = %path, name = %doc.name, "Created plan document");
        self.initialized.insert(path);
        Ok(SelectOutcome::Created)
    }
}
