use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed document or collection path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The backend rejected or could not complete the request
    /// (offline, network failure, permission denied).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal lock poisoned by a panicking writer.
    #[error("Store state lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
