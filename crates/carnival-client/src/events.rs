//! Messages exchanged with the planner session task.

use tokio::sync::oneshot;

use carnival_shared::{FestivalId, ItemId, PlanDocument, PlanField, PlanTier, UserId};

use crate::directory::SavedPlan;
use crate::editors::{BudgetDraft, PackingDraft, ScheduleDraft};
use crate::state::SessionView;

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum SessionCommand {
    SignIn,
    SignOut,
    /// Make a catalog festival the active plan.
    Select {
        festival: FestivalId,
    },
    AddBudget(BudgetDraft),
    RemoveBudget(ItemId),
    AddSchedule(ScheduleDraft),
    RemoveSchedule(ItemId),
    AddPacking(PackingDraft),
    RemovePacking(ItemId),
    TogglePacked(ItemId),
    StartCheckout(PlanTier),
    /// Request a snapshot of the session state.
    Inspect(oneshot::Sender<SessionView>),
    /// Stop the session task.
    Shutdown,
}

impl SessionCommand {
    /// Commands that read and rewrite a plan sub-list.
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::AddBudget(_)
                | Self::RemoveBudget(_)
                | Self::AddSchedule(_)
                | Self::RemoveSchedule(_)
                | Self::AddPacking(_)
                | Self::RemovePacking(_)
                | Self::TogglePacked(_)
        )
    }
}

/// Problems the user has to see, as opposed to background failures that
/// are only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAlert {
    /// An action needs a signed-in user.
    SignInRequired,
    SignInFailed(String),
    UnknownFestival(String),
    CheckoutFailed(String),
}

impl std::fmt::Display for UserAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignInRequired => f.write_str("Please sign in first."),
            Self::SignInFailed(reason) => f.write_str(reason),
            Self::UnknownFestival(id) => write!(f, "No carnival with id '{id}'."),
            Self::CheckoutFailed(reason) => write!(f, "Could not start checkout: {reason}"),
        }
    }
}

/// Notifications sent *from* the session task.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    IdentityChanged(Option<UserId>),
    PremiumChanged(bool),
    ActivePlanChanged(FestivalId),
    /// A snapshot of the active plan was applied. `None` when the document
    /// does not exist (yet).
    PlanUpdated {
        festival: FestivalId,
        plan: Option<PlanDocument>,
    },
    SavedPlansChanged(Vec<SavedPlan>),
    /// A background write was rejected by the store. The plan keeps its last
    /// confirmed state.
    WriteFailed {
        field: PlanField,
        error: String,
    },
    /// An edit was refused before any write, e.g. a required field is empty.
    EditRejected {
        field: PlanField,
        reason: String,
    },
    /// The item id an add produced, for drivers that want to refer to it.
    EntryAdded {
        field: PlanField,
        id: ItemId,
    },
    Alert(UserAlert),
    CheckoutRedirect {
        url: String,
    },
}
