//! Error types for the remote object store surface.

use thiserror::Error;

/// Result type alias for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Error variants returned by a remote object store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The requested item does not exist (404-equivalent).
    #[error("Item not found: {id}")]
    NotFound {
        /// The item id that was not found.
        id: String,
    },

    /// The supplied page token was not issued by this store or has expired.
    #[error("Invalid page token: {token}")]
    InvalidPageToken {
        /// The offending token.
        token: String,
    },

    /// The credential behind this handle is not allowed to act on the item.
    #[error("Permission denied on item: {id}")]
    PermissionDenied {
        /// The item id.
        id: String,
    },

    /// A transient provider failure (timeouts, throttling). Safe to retry.
    #[error("Transient provider failure: {reason}")]
    Transient {
        /// Description of the failure.
        reason: String,
    },

    /// Any other remote failure, propagated unchanged.
    #[error("Provider error: {reason}")]
    Provider {
        /// Description of the failure.
        reason: String,
    },
}

impl RemoteError {
    /// True for failures where a bounded retry is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient { .. })
    }

    /// True for the 404-equivalent variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}
