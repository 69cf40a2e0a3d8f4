//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`AssetCycleError`] via `#[from]`. There are no `String` variants: the
//! HTTP adapter maps each variant to a status code.

use crate::id::RunId;

/// Top-level error for every fallible operation in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum AssetCycleError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A storage adapter failed (connection lost, query error, …).
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A lifecycle run is already in progress.
    #[error("lifecycle run {run_id} is already in progress")]
    AlreadyRunning { run_id: RunId },

    /// The previous run finished too recently.
    #[error("lifecycle engine is cooling down, retry in {retry_after_secs}s")]
    CoolingDown { retry_after_secs: u64 },

    /// The engine is stopping and accepts no new runs.
    #[error("lifecycle engine is shutting down")]
    ShuttingDown,
}

/// Invalid input rejected before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} must not contain blank entries")]
    BlankEntry { field: &'static str },

    #[error("name must not be empty")]
    EmptyName,

    #[error("category must not be empty")]
    EmptyCategory,

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Name of the offending field, when the error concerns one.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::OutOfRange { field, .. } | Self::BlankEntry { field } => Some(field),
            Self::EmptyName => Some("name"),
            Self::EmptyCategory => Some("category"),
            Self::InvalidId(_) | Self::MalformedBody(_) => None,
        }
    }
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
