//! Error type shared by every `ToyStore` implementation.

use thiserror::Error;

/// Failures surfaced by the store layer.
///
/// Client-caused failures (`InvalidIdentifier`, `InvalidSort`) are kept apart
/// from database faults so the transport can map them to distinct statuses.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The identifier string cannot be turned into a record id.
    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// The sort parameter names a field that cannot be sorted on.
    #[error("invalid sort '{value}': {reason}")]
    InvalidSort { value: String, reason: String },

    /// The database could not be reached or initialized.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Any other database fault.
    #[error("store error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn invalid_identifier(value: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidIdentifier {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_sort(value: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidSort {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the caller, not the database, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidIdentifier { .. } | StoreError::InvalidSort { .. }
        )
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        // Transport failures and unset connections mean the database is out
        // of reach, not that the statement was wrong.
        if err.is_connection() {
            StoreError::Unavailable {
                message: err.to_string(),
            }
        } else {
            StoreError::Backend {
                message: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
