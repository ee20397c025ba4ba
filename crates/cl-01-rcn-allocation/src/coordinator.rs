//! # Allocation Coordinator
//!
//! Owns the write path to `allocated_rcn`. Collateral transfers against the
//! shop's main balance happen strictly outside the row lock:
//!
//! - `allocate` debits the collaborator first, then takes the row lock and
//!   commits the grant; a failed write after the debit is compensated by a
//!   best-effort credit.
//! - `deallocate` validates and shrinks the row under the lock, releases
//!   the lock, then credits the collaborator; a failed credit restores the
//!   row so no partial state survives.
//!
//! The lock table is shared with the group ledger so earns consuming
//! `used_rcn` serialize against allocation changes on the same row.

use std::sync::Arc;
use std::time::Duration;

use coalition_telemetry::{LEDGER_REJECTIONS, RCN_ALLOCATED, RCN_DEALLOCATED};
use rust_decimal::prelude::ToPrimitive;
use shared_types::{Decimal, GroupId, KeyedLockTable, ShopId};
use tracing::{error, info, warn};

use crate::domain::entities::{AllocationKey, ShopGroupRcnAllocation};
use crate::domain::errors::AllocationError;
use crate::ports::outbound::{DebitOutcome, ShopBalanceService};
use crate::ports::stores::AllocationStore;

/// Default bounded wait for an allocation row lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Coordinates collateral movement between shop main balances and
/// per-group allocation rows.
pub struct AllocationCoordinator<A, S>
where
    A: AllocationStore,
    S: ShopBalanceService,
{
    store: A,
    shop_balance: S,
    locks: Arc<KeyedLockTable<AllocationKey>>,
    lock_wait: Duration,
}

impl<A, S> AllocationCoordinator<A, S>
where
    A: AllocationStore,
    S: ShopBalanceService,
{
    /// Create a coordinator sharing `locks` with the group ledger.
    pub fn new(store: A, shop_balance: S, locks: Arc<KeyedLockTable<AllocationKey>>) -> Self {
        Self {
            store,
            shop_balance,
            locks,
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// Override the bounded lock wait.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Access the underlying store (snapshot reads).
    pub fn store(&self) -> &A {
        &self.store
    }

    /// Commit `amount` of the shop's main-currency balance as backing for
    /// `group`.
    ///
    /// The debit completes before the row lock is taken; the lock is never
    /// held across the external call.
    pub async fn allocate(
        &self,
        shop: &ShopId,
        group: &GroupId,
        amount: Decimal,
    ) -> Result<ShopGroupRcnAllocation, AllocationError> {
        ensure_positive("allocate", amount)?;

        match self.shop_balance.debit(shop, amount).await {
            Ok(DebitOutcome::Accepted) => {}
            Ok(DebitOutcome::Insufficient) => {
                LEDGER_REJECTIONS
                    .with_label_values(&["allocate", "shop_balance_insufficient"])
                    .inc();
                return Err(AllocationError::ShopBalanceInsufficient {
                    shop: shop.clone(),
                    requested: amount,
                });
            }
            Err(e) => {
                return Err(AllocationError::ExternalDependency {
                    message: e.to_string(),
                })
            }
        }

        let key = (shop.clone(), group.clone());
        let result = async {
            let _guard = self.locks.acquire(&key, self.lock_wait).await?;

            let mut record = self.store.get_or_create(shop, group)?;
            record.grant(amount)?;
            self.store.write(record.clone())?;
            Ok(record)
        }
        .await;

        match result {
            Ok(record) => {
                RCN_ALLOCATED.inc_by(amount.to_f64().unwrap_or(0.0));
                info!(
                    shop = %shop,
                    group = %group,
                    amount = %amount,
                    allocated = %record.allocated_rcn,
                    "rcn allocated to group"
                );
                Ok(record)
            }
            Err(e) => {
                // The debit already went through; hand the funds back.
                if let Err(credit_err) = self.shop_balance.credit(shop, amount).await {
                    error!(
                        shop = %shop,
                        group = %group,
                        amount = %amount,
                        error = %credit_err,
                        "compensating credit failed after aborted allocation"
                    );
                }
                Err(e)
            }
        }
    }

    /// Return `amount` of unused collateral to the shop's main balance.
    ///
    /// Collateral currently backing issued tokens can never be
    /// deallocated; only the unused remainder is returnable.
    pub async fn deallocate(
        &self,
        shop: &ShopId,
        group: &GroupId,
        amount: Decimal,
    ) -> Result<ShopGroupRcnAllocation, AllocationError> {
        ensure_positive("deallocate", amount)?;

        let key = (shop.clone(), group.clone());
        let record = {
            let _guard = self.locks.acquire(&key, self.lock_wait).await?;

            let Some(mut record) = self.store.get(shop, group)? else {
                LEDGER_REJECTIONS
                    .with_label_values(&["deallocate", "insufficient_available"])
                    .inc();
                return Err(AllocationError::InsufficientAvailableAllocation {
                    requested: amount,
                    available: Decimal::ZERO,
                });
            };

            let available = record.available_rcn();
            if amount > available {
                LEDGER_REJECTIONS
                    .with_label_values(&["deallocate", "insufficient_available"])
                    .inc();
                return Err(AllocationError::InsufficientAvailableAllocation {
                    requested: amount,
                    available,
                });
            }

            record.reclaim(amount)?;
            self.store.write(record.clone())?;
            record
        };

        // Row lock released; settle with the collaborator.
        if let Err(e) = self.shop_balance.credit(shop, amount).await {
            warn!(
                shop = %shop,
                group = %group,
                amount = %amount,
                error = %e,
                "credit failed after deallocation, restoring row"
            );
            self.restore_grant(shop, group, amount).await;
            return Err(AllocationError::ExternalDependency {
                message: e.to_string(),
            });
        }

        RCN_DEALLOCATED.inc_by(amount.to_f64().unwrap_or(0.0));
        info!(
            shop = %shop,
            group = %group,
            amount = %amount,
            allocated = %record.allocated_rcn,
            "rcn returned to shop"
        );
        Ok(record)
    }

    /// Snapshot read of one allocation row.
    pub fn allocation(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<Option<ShopGroupRcnAllocation>, AllocationError> {
        Ok(self.store.get(shop, group)?)
    }

    /// Snapshot of every allocation a shop holds.
    pub fn shop_allocations(
        &self,
        shop: &ShopId,
    ) -> Result<Vec<ShopGroupRcnAllocation>, AllocationError> {
        Ok(self.store.list_for_shop(shop)?)
    }

    /// Snapshot of every shop's allocation into a group.
    pub fn group_allocations(
        &self,
        group: &GroupId,
    ) -> Result<Vec<ShopGroupRcnAllocation>, AllocationError> {
        Ok(self.store.list_for_group(group)?)
    }

    /// Put a reclaimed amount back on the row after a failed credit.
    async fn restore_grant(&self, shop: &ShopId, group: &GroupId, amount: Decimal) {
        let key = (shop.clone(), group.clone());
        let restored = async {
            let _guard = self.locks.acquire(&key, self.lock_wait).await?;
            let mut record = self.store.get_or_create(shop, group)?;
            record.grant(amount)?;
            self.store.write(record)?;
            Ok::<(), AllocationError>(())
        }
        .await;

        if let Err(e) = restored {
            coalition_telemetry::INVARIANT_VIOLATIONS.inc();
            error!(
                shop = %shop,
                group = %group,
                amount = %amount,
                error = %e,
                "failed to restore allocation row after failed credit"
            );
        }
    }
}

fn ensure_positive(operation: &str, amount: Decimal) -> Result<(), AllocationError> {
    if amount <= Decimal::ZERO {
        LEDGER_REJECTIONS
            .with_label_values(&[operation, "invalid_amount"])
            .inc();
        return Err(AllocationError::InvalidAmount { amount });
    }
    Ok(())
}
