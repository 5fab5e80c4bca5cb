//! The failures reported by the profile and post stores.

use crate::Error;

/// Why a store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The record does not exist.
    NotFound,
    /// The store could not be reached, e.g. it is locked or busy.
    Unavailable,
    /// Any other failure.
    Unknown,
}

impl StoreErrorKind {
    /// The message to show the user when a store operation fails.
    pub fn user_message(self) -> &'static str {
        match self {
            StoreErrorKind::NotFound => "The requested item could not be found.",
            StoreErrorKind::Unavailable => "Network error. Please check your connection.",
            StoreErrorKind::Unknown => "An unexpected error occurred.",
        }
    }
}

impl From<Error> for StoreErrorKind {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound => StoreErrorKind::NotFound,
            Error::DatabaseLockError => StoreErrorKind::Unavailable,
            Error::SqlError(rusqlite::Error::SqliteFailure(sql_error, _))
                if matches!(
                    sql_error.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                StoreErrorKind::Unavailable
            }
            error => {
                tracing::error!("Unhandled store error: {error}");
                StoreErrorKind::Unknown
            }
        }
    }
}
