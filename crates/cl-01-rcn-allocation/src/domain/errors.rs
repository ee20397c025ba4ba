use shared_types::{Decimal, LockTableError, ShopId, StoreError};
use thiserror::Error;

/// Errors from the RCN allocation subsystem.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: Decimal },

    #[error("insufficient available allocation: requested {requested}, available {available}")]
    InsufficientAvailableAllocation {
        requested: Decimal,
        available: Decimal,
    },

    #[error("shop {shop} main balance declined debit of {requested}")]
    ShopBalanceInsufficient { shop: ShopId, requested: Decimal },

    #[error("shop balance service failed: {message}")]
    ExternalDependency { message: String },

    #[error("allocation row busy: lock wait expired after {waited_ms}ms")]
    Busy { waited_ms: u64 },

    #[error("invariant violation: {detail}")]
    InvariantViolation { detail: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LockTableError> for AllocationError {
    fn from(err: LockTableError) -> Self {
        match err {
            LockTableError::WaitExpired { waited_ms } => AllocationError::Busy { waited_ms },
            LockTableError::Poisoned => AllocationError::InvariantViolation {
                detail: "allocation lock table poisoned".to_string(),
            },
        }
    }
}
