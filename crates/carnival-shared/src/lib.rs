//! # carnival-shared
//!
//! Pure domain types for the carnival planner: identifiers, the static
//! festival catalog and countdown table, the plan document with its three
//! sub-lists, subscription tiers and post-checkout routes.
//!
//! Nothing in this crate performs I/O.

pub mod catalog;
pub mod constants;
pub mod countdown;
pub mod error;
pub mod plan;
pub mod routes;
pub mod types;

pub use error::DomainError;
pub use plan::{BudgetItem, PackingItem, PlanDocument, PlanEntry, PlanField, ScheduleItem};
pub use types::{FestivalId, ItemId, PlanTier, UserId};
