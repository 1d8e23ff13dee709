use thiserror::Error;

use carnival_shared::DomainError;
use carnival_store::StoreError;

/// Failures of the read/merge/write path to the remote plan document.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No active plan selected")]
    NoActivePlan,

    #[error("Failed to encode plan field: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Encoded document is not an object")]
    NotAnObject,
}

/// Why a list edit was not turned into a write.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Sign in to edit plans")]
    SignInRequired,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Plan has not loaded yet")]
    PlanNotLoaded,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Sign-in failed: {0}")]
    SignInFailed(String),

    #[error("Sign-out failed: {0}")]
    SignOutFailed(String),
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Sign in to upgrade")]
    SignInRequired,

    #[error("Checkout request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Checkout service error: {0}")]
    Service(String),

    #[error("Checkout response did not contain a URL")]
    MissingUrl,

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Planner session has stopped")]
    Closed,

    #[error("Planner session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
