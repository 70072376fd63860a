use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed failure surfaced by the lifecycle services.
///
/// The services perform no local recovery: every failure propagates verbatim
/// to the calling layer, which translates it into a transport code.
#[derive(Debug, Error)]
pub enum HiveManagementError {
    /// No record exists for the requested identifier.
    #[error("requested resource was not found")]
    NotFound,

    /// The request collides with existing state. A duplicate business key
    /// names the offending field; a purge of a record that is not
    /// soft-deleted carries no field.
    #[error("request conflicts with current state{}", match .field {
        Some(f) => format!(" (field `{f}`)"),
        None => String::new(),
    })]
    Conflict { field: Option<&'static str> },

    /// The store failed to execute a statement — a constraint violation not
    /// anticipated by the pre-checks, or a connectivity/IO failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl HiveManagementError {
    /// A conflict with no offending field (e.g. purging an active record).
    pub fn conflict() -> Self {
        Self::Conflict { field: None }
    }

    /// A conflict on a named field (e.g. a duplicate `code`).
    pub fn conflict_on(field: &'static str) -> Self {
        Self::Conflict { field: Some(field) }
    }

    /// Returns the broad error kind for transport-code translation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Classification of errors for the routing/API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requested resource is absent. Never retried.
    NotFound,
    /// The caller must change their input or the resource state first.
    Conflict,
    /// The store failed; transient or fatal depending on cause.
    Storage,
}

/// Result alias used throughout the service layer.
pub type ServiceResult<T> = Result<T, HiveManagementError>;

// ===========================================================================
// Tests
// ===========================================================================
