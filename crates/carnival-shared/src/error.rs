use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown festival: {0}")]
    UnknownFestival(String),

    #[error("Unknown plan tier: {0}")]
    UnknownTier(String),

    #[error("Invalid schedule datetime: {0}")]
    InvalidDatetime(String),
}
