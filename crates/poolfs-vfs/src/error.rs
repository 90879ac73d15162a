//! Error taxonomy for the pooling filesystem layer.

use poolfs_remote::RemoteError;
use thiserror::Error;

/// Result type alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// Error variants for filesystem operations.
///
/// Callers branch on the variant, never on message content. Remote
/// provider failures pass through unchanged in the `Remote` variant.
#[derive(Debug, Error)]
pub enum FsError {
    /// Invalid arguments or a duplicate name in the target folder.
    /// Surfaced before any remote write is attempted.
    #[error("Validation failed: {reason}")]
    Validation {
        /// What was wrong with the request.
        reason: String,
    },

    /// The referenced object does not exist in the namespace.
    #[error("No such object: {id}")]
    NotFound {
        /// The id that failed to resolve.
        id: String,
    },

    /// Every data account is full, or the object exceeds the largest
    /// single account's free capacity. Terminal for an upload.
    #[error("Capacity exhausted: no data account has {required} free bytes")]
    CapacityExhausted {
        /// Bytes the upload needed.
        required: u64,
    },

    /// An object's owning account could not be resolved against the pool.
    #[error("Cannot resolve owning account: {detail}")]
    AuthResolution {
        /// What failed to resolve.
        detail: String,
    },

    /// A move destination is not a directory.
    #[error("Not a directory: {id}")]
    NotDirectory {
        /// The offending destination id.
        id: String,
    },

    /// Shortcut metadata could not be encoded.
    #[error("Metadata encoding error: {reason}")]
    Metadata {
        /// Description of the failure.
        reason: String,
    },

    /// Any other remote failure, propagated unchanged.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl FsError {
    /// Shorthand for a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        FsError::Validation {
            reason: reason.into(),
        }
    }

    /// Shorthand for an owner-resolution failure.
    pub fn auth_resolution(detail: impl Into<String>) -> Self {
        FsError::AuthResolution {
            detail: detail.into(),
        }
    }
}
