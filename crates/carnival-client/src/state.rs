//! Point-in-time view of a planner session.

use carnival_shared::{FestivalId, PlanDocument, UserId};

use crate::directory::SavedPlan;

/// What the session currently knows, as returned by
/// [`SessionCommand::Inspect`](crate::events::SessionCommand::Inspect).
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    /// `None` while signed out.
    pub identity: Option<UserId>,

    /// Mirrors the entitlement record; always `false` while signed out.
    pub premium: bool,

    /// `None` only before the first selection.
    pub active_plan: Option<FestivalId>,

    /// Last confirmed snapshot of the active plan.
    pub plan: Option<PlanDocument>,

    pub saved_plans: Vec<SavedPlan>,
}

impl SessionView {
    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Premium features are only offered to a signed-in, entitled user.
    pub fn can_use_premium(&self) -> bool {
        self.is_signed_in() && self.premium
    }
}
