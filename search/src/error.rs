//! Error types for search and callback dispatch.

use mediadex_store::StoreError;
use thiserror::Error;

/// Errors raised while searching or resolving callback tokens.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The token's action prefix is not one this library understands.
    #[error("unknown callback action '{0}'")]
    UnknownAction(String),

    /// The action is known but its payload is missing or unparsable.
    #[error("malformed callback token '{token}': {reason}")]
    MalformedToken { token: String, reason: String },

    /// Navigation arrived for a requester with no open search.
    #[error("requester {0} has no active search")]
    NoActiveSearch(i64),

    /// A batch action arrived for a requester with nothing pending.
    #[error("requester {0} has no pending media")]
    NoPendingBatch(i64),
}

impl LibraryError {
    /// Rejections caused by the incoming token or session state rather than
    /// by storage.
    pub fn is_rejected_input(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Convenience alias for results with [`LibraryError`].
pub type Result<T> = std::result::Result<T, LibraryError>;
