/// Application name
pub const APP_NAME: &str = "Carnival Planner";

/// Namespace under `users/{uid}/apps/` that holds this application's records
pub const DEFAULT_APP_NAMESPACE: &str = "carnival-planner-v1";

/// Collection under the app namespace holding one document per festival plan
pub const PLANS_COLLECTION: &str = "carnivals";

/// Entitlement record field toggled by the payment system
pub const PREMIUM_ACTIVE_FIELD: &str = "premiumActive";

/// Post-checkout routes served by the web front end
pub const CHECKOUT_SUCCESS_PATH: &str = "/checkout-success";
pub const CHECKOUT_CANCEL_PATH: &str = "/checkout-cancelled";

/// Placeholder the payment provider substitutes with the session id
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Input format of schedule timestamps (HTML `datetime-local`)
pub const SCHEDULE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
