use shared_types::{Decimal, LockTableError, StoreError};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the group token ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: Decimal },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("insufficient backing: required {required}, available {available}")]
    InsufficientBacking {
        required: Decimal,
        available: Decimal,
    },

    #[error("ledger row busy: lock wait expired after {waited_ms}ms")]
    Busy { waited_ms: u64 },

    #[error("duplicate transaction id: {id}")]
    DuplicateTransaction { id: Uuid },

    #[error("invariant violation: {detail}")]
    InvariantViolation { detail: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEntry { id } => match Uuid::parse_str(&id) {
                Ok(id) => LedgerError::DuplicateTransaction { id },
                Err(_) => LedgerError::Store(StoreError::DuplicateEntry { id }),
            },
            other => LedgerError::Store(other),
        }
    }
}

impl From<LockTableError> for LedgerError {
    fn from(err: LockTableError) -> Self {
        match err {
            LockTableError::WaitExpired { waited_ms } => LedgerError::Busy { waited_ms },
            LockTableError::Poisoned => LedgerError::InvariantViolation {
                detail: "ledger lock table poisoned".to_string(),
            },
        }
    }
}
