//! Outbound port: the shop main-balance collaborator.
//!
//! The platform's primary-currency balance lives outside this subsystem.
//! Allocation debits it before any row lock is taken and credits it after
//! the row lock is released, so a lock is never held across a network
//! round-trip.

use async_trait::async_trait;
use shared_types::{Decimal, ShopId};

/// Outcome of a debit attempt against a shop's main balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Funds were reserved and removed from the main balance.
    Accepted,
    /// The main balance could not cover the amount; nothing was debited.
    Insufficient,
}

/// Transport/infrastructure failure talking to the shop balance service.
#[derive(Debug, thiserror::Error)]
#[error("shop balance service: {message}")]
pub struct ShopBalanceError {
    pub message: String,
}

/// The Shop Balance collaborator.
#[async_trait]
pub trait ShopBalanceService: Send + Sync {
    /// Debit `amount` from the shop's main balance.
    async fn debit(&self, shop: &ShopId, amount: Decimal)
        -> Result<DebitOutcome, ShopBalanceError>;

    /// Credit `amount` back to the shop's main balance.
    async fn credit(&self, shop: &ShopId, amount: Decimal) -> Result<(), ShopBalanceError>;
}
