//! Demo mode: a guest user with a pre-filled Trinidad plan.

use serde_json::json;
use tracing::info;

use carnival_shared::{FestivalId, PlanDocument, UserId};
use carnival_store::RealtimeStore;

use crate::error::SyncError;
use crate::paths::AppPaths;
use crate::sync::document_fields;

pub const DEMO_UID: &str = "demo-user-123";
pub const DEMO_FESTIVAL: &str = "trinidad";

pub fn demo_user() -> UserId {
    UserId::new(DEMO_UID)
}

fn demo_fields() -> serde_json::Value {
    json!({
        "name": "Trinidad Carnival - February",
        "budget": [
            { "id": "1", "name": "Flight (JFK -> POS)", "cost": 850.00 },
            { "id": "2", "name": "Airbnb (Woodbrook)", "cost": 1200.00 },
            { "id": "3", "name": "Costume Deposit", "cost": 300.00 },
            { "id": "4", "name": "Spending Money", "cost": 500.00 }
        ],
        "schedule": [
            { "id": "1", "title": "Arrival at Piarco", "datetime": "2026-02-11T14:30", "note": "Grab doubles at airport" },
            { "id": "2", "title": "Tribe Costume Pickup", "datetime": "2026-02-12T10:00", "note": "Bring ID and receipt" },
            { "id": "3", "title": "AM Bush", "datetime": "2026-02-14T02:00", "note": "J'ouvert wear needed" },
            { "id": "4", "title": "Soca Brainwash", "datetime": "2026-02-14T11:00", "note": "The main event!" },
            { "id": "5", "title": "Sunny Side Up", "datetime": "2026-02-15T04:00", "note": "Breakfast cooler fete" },
            { "id": "6", "title": "Carnival Monday", "datetime": "2026-02-16T10:00", "note": "Meet at the truck" }
        ],
        "packing": [
            { "id": "1", "item": "Passport", "checked": true },
            { "id": "2", "item": "Sunblock", "checked": false },
            { "id": "3", "item": "Power bank", "checked": true },
            { "id": "4", "item": "Comfortable carnival boots", "checked": false },
            { "id": "5", "item": "Vitamins", "checked": true }
        ]
    })
}

pub fn demo_plan() -> Result<PlanDocument, SyncError> {
    Ok(serde_json::from_value(demo_fields())?)
}

/// Write the demo plan for the demo user. Existing fields are replaced.
pub async fn seed(store: &dyn RealtimeStore, paths: &AppPaths) -> Result<(), SyncError> {
    let path = paths.plan(&demo_user(), &FestivalId::new(DEMO_FESTIVAL))?;
    let fields = document_fields(&demo_plan()?)?;
    store.merge_write(&path, fields).await?;
    info!(path = %path, "Seeded demo plan");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carnival_store::MemoryStore;

    #[test]
    fn demo_plan_decodes() {
        let plan = demo_plan().unwrap();
        assert_eq!(plan.budget.len(), 4);
        assert_eq!(plan.budget_total(), 2850.0);
        assert_eq!(plan.packing_progress(), (3, 5));
        assert_eq!(plan.sorted_schedule()[0].title, "Arrival at Piarco");
    }

    #[tokio::test]
    async fn seed_writes_demo_plan() {
        let store = MemoryStore::new();
        let paths = AppPaths::new("carnival-planner-v1");
        seed(&store, &paths).await.unwrap();

        let path = paths
            .plan(&demo_user(), &FestivalId::new(DEMO_FESTIVAL))
            .unwrap();
        let doc = store.document(&path).unwrap().unwrap();
        assert_eq!(doc["schedule"].as_array().unwrap().len(), 6);
    }
}
