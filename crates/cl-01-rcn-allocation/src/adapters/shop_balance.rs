//! In-memory shop balance collaborator.
//!
//! Production deployments talk to the platform's Shop Balance service over
//! the wire; this adapter backs tests and standalone development.

use crate::ports::outbound::{DebitOutcome, ShopBalanceError, ShopBalanceService};
use async_trait::async_trait;
use shared_types::{Decimal, ShopId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Map-backed `ShopBalanceService`.
#[derive(Default)]
pub struct InMemoryShopBalanceService {
    balances: RwLock<HashMap<ShopId, Decimal>>,
}

impl InMemoryShopBalanceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a shop's main balance.
    pub fn with_balance(self, shop: impl Into<ShopId>, amount: Decimal) -> Self {
        if let Ok(mut balances) = self.balances.write() {
            balances.insert(shop.into(), amount);
        }
        self
    }

    /// Current main balance for a shop (zero if unknown).
    pub fn balance_of(&self, shop: &ShopId) -> Decimal {
        self.balances
            .read()
            .map(|b| b.get(shop).copied().unwrap_or(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl ShopBalanceService for InMemoryShopBalanceService {
    async fn debit(
        &self,
        shop: &ShopId,
        amount: Decimal,
    ) -> Result<DebitOutcome, ShopBalanceError> {
        let mut balances = self.balances.write().map_err(|_| ShopBalanceError {
            message: "balance map poisoned".to_string(),
        })?;

        let current = balances.entry(shop.clone()).or_insert(Decimal::ZERO);
        if *current < amount {
            return Ok(DebitOutcome::Insufficient);
        }

        *current -= amount;
        Ok(DebitOutcome::Accepted)
    }

    async fn credit(&self, shop: &ShopId, amount: Decimal) -> Result<(), ShopBalanceError> {
        let mut balances = self.balances.write().map_err(|_| ShopBalanceError {
            message: "balance map poisoned".to_string(),
        })?;

        *balances.entry(shop.clone()).or_insert(Decimal::ZERO) += amount;
        Ok(())
    }
}
