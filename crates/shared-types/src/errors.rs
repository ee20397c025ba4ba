//! Store-level errors shared by every persistence port.

use thiserror::Error;

/// Errors from balance, allocation and transaction-log stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An interior lock was poisoned by a panicking thread.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// An append-only store rejected a second write with the same id.
    #[error("duplicate entry: {id}")]
    DuplicateEntry {
        /// Identity of the rejected entry.
        id: String,
    },

    /// A durable adapter failed talking to its backing file.
    #[error("store I/O error: {message}")]
    Io {
        /// Underlying failure description.
        message: String,
    },
}
