//! # Ledger Coordinator
//!
//! The only component permitted to mutate balance rows and the `used_rcn`
//! side of allocation rows. Every mutating operation:
//!
//! 1. acquires the allocation row lock, then the balance row lock (fixed
//!    order on every path, so concurrent earns and redeems cannot
//!    deadlock),
//! 2. validates against current row state,
//! 3. writes both rows and appends exactly one log entry, restoring the
//!    prior row snapshots if a later write fails while the locks are
//!    still held.
//!
//! Operations on different keys proceed independently; operations on the
//! same key serialize on the row lock with a bounded wait that surfaces
//! as `Busy`.

use std::sync::Arc;

use cl_01_rcn_allocation::{AllocationError, AllocationKey, AllocationStore, ShopGroupRcnAllocation};
use coalition_telemetry::{
    BACKING_CLAMPS, INVARIANT_VIOLATIONS, LEDGER_REJECTIONS, TOKENS_EARNED, TOKENS_REDEEMED,
    TRANSACTIONS_RECORDED,
};
use rust_decimal::prelude::ToPrimitive;
use shared_types::{
    Clock, CustomerAddress, Decimal, GroupId, KeyedLockTable, Page, PageRequest, ShopId,
};
use tracing::{error, info, warn};

use crate::domain::analytics;
use crate::domain::entities::{
    BalanceKey, GroupTokenBalance, GroupTokenTransaction, LedgerConfig, TransactionKind,
};
use crate::domain::errors::LedgerError;
use crate::domain::value_objects::{
    GroupAnalytics, LedgerReceipt, ReplayReport, ShopActivity, TrendPoint,
};
use crate::ports::stores::{BalanceStore, TransactionLog};

/// Coordinates earn/redeem against balances, backing and the audit log.
pub struct LedgerCoordinator<B, A, L, C>
where
    B: BalanceStore,
    A: AllocationStore,
    L: TransactionLog,
    C: Clock,
{
    balances: B,
    allocations: A,
    log: L,
    clock: C,
    config: LedgerConfig,
    /// Shared with the allocation coordinator so collateral changes and
    /// issuance serialize on the same row.
    alloc_locks: Arc<KeyedLockTable<AllocationKey>>,
    balance_locks: KeyedLockTable<BalanceKey>,
}

impl<B, A, L, C> LedgerCoordinator<B, A, L, C>
where
    B: BalanceStore,
    A: AllocationStore,
    L: TransactionLog,
    C: Clock,
{
    /// Create a coordinator with injected stores and clock.
    pub fn new(
        balances: B,
        allocations: A,
        log: L,
        clock: C,
        config: LedgerConfig,
        alloc_locks: Arc<KeyedLockTable<AllocationKey>>,
    ) -> Self {
        Self {
            balances,
            allocations,
            log,
            clock,
            config,
            alloc_locks,
            balance_locks: KeyedLockTable::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Issue `amount` group tokens to a customer, consuming backing from
    /// the shop's allocation row.
    ///
    /// The shop's membership in the group is a precondition checked by the
    /// caller layer; it is not re-validated here.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBacking` if the shop's available collateral cannot
    ///   cover `amount * backing_ratio` (an absent row reads as zero)
    /// - `Busy` if a row lock could not be acquired within the bounded wait
    pub async fn earn(
        &self,
        shop: &ShopId,
        group: &GroupId,
        customer: &CustomerAddress,
        amount: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.ensure_positive("earn", amount)?;

        let alloc_key = (shop.clone(), group.clone());
        let _alloc_guard = self
            .alloc_locks
            .acquire(&alloc_key, self.config.lock_wait)
            .await?;

        // Absent allocation row reads as zero available backing; earn never
        // creates it.
        let allocation = self.allocations.get(shop, group)?;
        let available = allocation
            .as_ref()
            .map(ShopGroupRcnAllocation::available_rcn)
            .unwrap_or(Decimal::ZERO);
        let required = amount * self.config.backing_ratio;

        if required > available {
            LEDGER_REJECTIONS
                .with_label_values(&["earn", "insufficient_backing"])
                .inc();
            return Err(LedgerError::InsufficientBacking {
                required,
                available,
            });
        }

        let balance_key = (customer.clone(), group.clone());
        let _balance_guard = self
            .balance_locks
            .acquire(&balance_key, self.config.lock_wait)
            .await?;

        let now = self.clock.now();
        let prior_balance = self.balances.get_or_create(customer, group)?;
        let mut new_balance = prior_balance.clone();
        new_balance
            .credit(amount, now)
            .map_err(|e| self.track_invariant(e))?;

        let updated_allocation = match (&allocation, required > Decimal::ZERO) {
            (Some(record), true) => {
                let mut updated = record.clone();
                updated
                    .consume_backing(required)
                    .map_err(|e| self.track_invariant(allocation_invariant(e)))?;
                Some(updated)
            }
            (None, true) => {
                // available >= required > 0 cannot hold without a row.
                return Err(self.track_invariant(LedgerError::InvariantViolation {
                    detail: format!(
                        "earn for {shop}/{group} passed backing check without an allocation row"
                    ),
                }));
            }
            (_, false) => None,
        };

        let entry = GroupTokenTransaction::earn(
            group.clone(),
            customer.clone(),
            shop.clone(),
            amount,
            prior_balance.balance,
            reason,
            metadata,
            now,
        );
        let transaction_id = entry.id;

        self.commit(
            &new_balance,
            &prior_balance,
            updated_allocation,
            allocation,
            entry,
        )?;

        TOKENS_EARNED.inc_by(amount.to_f64().unwrap_or(0.0));
        TRANSACTIONS_RECORDED.inc();
        info!(
            shop = %shop,
            group = %group,
            customer = %customer,
            amount = %amount,
            balance = %new_balance.balance,
            backing_consumed = %required,
            "tokens earned"
        );

        Ok(LedgerReceipt {
            balance: new_balance,
            transaction_id,
        })
    }

    /// Redeem `amount` group tokens from a customer's balance, releasing
    /// the corresponding backing on the shop's allocation row.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBalance` if the balance cannot cover the amount (no
    ///   partial redemption)
    /// - `Busy` if a row lock could not be acquired within the bounded wait
    pub async fn redeem(
        &self,
        shop: &ShopId,
        group: &GroupId,
        customer: &CustomerAddress,
        amount: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.ensure_positive("redeem", amount)?;

        let alloc_key = (shop.clone(), group.clone());
        let _alloc_guard = self
            .alloc_locks
            .acquire(&alloc_key, self.config.lock_wait)
            .await?;

        let balance_key = (customer.clone(), group.clone());
        let _balance_guard = self
            .balance_locks
            .acquire(&balance_key, self.config.lock_wait)
            .await?;

        let Some(prior_balance) = self.balances.get(customer, group)? else {
            LEDGER_REJECTIONS
                .with_label_values(&["redeem", "insufficient_balance"])
                .inc();
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: Decimal::ZERO,
            });
        };

        if prior_balance.balance < amount {
            LEDGER_REJECTIONS
                .with_label_values(&["redeem", "insufficient_balance"])
                .inc();
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: prior_balance.balance,
            });
        }

        let now = self.clock.now();
        let mut new_balance = prior_balance.clone();
        new_balance
            .debit(amount, now)
            .map_err(|e| self.track_invariant(e))?;

        // Backing freed by the redemption becomes available for future
        // issuance by the same shop.
        let refund = amount * self.config.backing_ratio;
        let allocation = self.allocations.get(shop, group)?;
        let updated_allocation = match &allocation {
            Some(record) if refund > Decimal::ZERO => {
                let mut updated = record.clone();
                let release = updated.release_backing(refund);
                if release.clamped {
                    self.reconcile_clamp(shop, group, refund, release.released)?;
                }
                Some(updated)
            }
            None if refund > Decimal::ZERO => {
                self.reconcile_clamp(shop, group, refund, Decimal::ZERO)?;
                None
            }
            _ => None,
        };

        let entry = GroupTokenTransaction::redeem(
            group.clone(),
            customer.clone(),
            shop.clone(),
            amount,
            prior_balance.balance,
            reason,
            metadata,
            now,
        );
        let transaction_id = entry.id;

        self.commit(
            &new_balance,
            &prior_balance,
            updated_allocation,
            allocation,
            entry,
        )?;

        TOKENS_REDEEMED.inc_by(amount.to_f64().unwrap_or(0.0));
        TRANSACTIONS_RECORDED.inc();
        info!(
            shop = %shop,
            group = %group,
            customer = %customer,
            amount = %amount,
            balance = %new_balance.balance,
            backing_released = %refund,
            "tokens redeemed"
        );

        Ok(LedgerReceipt {
            balance: new_balance,
            transaction_id,
        })
    }

    // =========================================================================
    // READS (lock-free snapshots, eventually consistent)
    // =========================================================================

    /// One balance row.
    pub fn balance(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Option<GroupTokenBalance>, LedgerError> {
        Ok(self.balances.get(customer, group)?)
    }

    /// All of a customer's balances across groups.
    pub fn customer_balances(
        &self,
        customer: &CustomerAddress,
    ) -> Result<Vec<GroupTokenBalance>, LedgerError> {
        Ok(self.balances.list_for_customer(customer)?)
    }

    /// A group's transactions, newest first.
    pub fn group_transactions(
        &self,
        group: &GroupId,
        kind: Option<TransactionKind>,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, LedgerError> {
        let page = page.clamped(self.config.max_page_size);
        Ok(self.log.list_by_group(group, kind, page)?)
    }

    /// One customer's transactions within a group, newest first.
    pub fn customer_transactions(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, LedgerError> {
        let page = page.clamped(self.config.max_page_size);
        Ok(self.log.list_by_customer_in_group(customer, group, page)?)
    }

    /// Aggregate totals for a group.
    pub fn group_analytics(&self, group: &GroupId) -> Result<GroupAnalytics, LedgerError> {
        let entries = self.log.snapshot_group(group)?;
        let allocations = self.allocations.list_for_group(group)?;
        Ok(analytics::group_analytics(group, &entries, &allocations))
    }

    /// Per-shop activity within a group, most active first.
    pub fn member_activity(&self, group: &GroupId) -> Result<Vec<ShopActivity>, LedgerError> {
        let entries = self.log.snapshot_group(group)?;
        Ok(analytics::member_activity(&entries))
    }

    /// Daily volumes for the trailing `days` days.
    pub fn transaction_trends(
        &self,
        group: &GroupId,
        days: u32,
    ) -> Result<Vec<TrendPoint>, LedgerError> {
        let entries = self.log.snapshot_group(group)?;
        Ok(analytics::transaction_trends(
            &entries,
            days,
            self.clock.now(),
        ))
    }

    /// Replay a (customer, group)'s log from zero and compare against the
    /// stored balance row.
    pub fn verify_replay(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<ReplayReport, LedgerError> {
        let entries = self.log.snapshot_customer(customer, group)?;
        let stored_balance = self
            .balances
            .get(customer, group)?
            .map(|row| row.balance)
            .unwrap_or(Decimal::ZERO);

        let mut running = Decimal::ZERO;
        let mut first_discrepancy = None;

        for (index, entry) in entries.iter().enumerate() {
            if first_discrepancy.is_none() && entry.balance_before != running {
                first_discrepancy = Some(format!(
                    "entry {index} ({}): balance_before {} does not chain from {running}",
                    entry.id, entry.balance_before
                ));
            }
            running += entry.signed_amount();
            if first_discrepancy.is_none() && entry.balance_after != running {
                first_discrepancy = Some(format!(
                    "entry {index} ({}): balance_after {} does not match replayed {running}",
                    entry.id, entry.balance_after
                ));
            }
        }

        if first_discrepancy.is_none() && running != stored_balance {
            first_discrepancy = Some(format!(
                "replayed balance {running} does not match stored {stored_balance}"
            ));
        }

        Ok(ReplayReport {
            customer_address: customer.clone(),
            group_id: group.clone(),
            entries_replayed: entries.len() as u64,
            computed_balance: running,
            stored_balance,
            consistent: first_discrepancy.is_none(),
            first_discrepancy,
        })
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Persist both rows and the log entry, restoring prior snapshots if a
    /// later write fails. Callers hold both row locks throughout.
    fn commit(
        &self,
        new_balance: &GroupTokenBalance,
        prior_balance: &GroupTokenBalance,
        new_allocation: Option<ShopGroupRcnAllocation>,
        prior_allocation: Option<ShopGroupRcnAllocation>,
        entry: GroupTokenTransaction,
    ) -> Result<(), LedgerError> {
        self.balances.write(new_balance.clone())?;

        if let Some(allocation) = new_allocation {
            if let Err(e) = self.allocations.write(allocation) {
                self.restore_balance(prior_balance);
                return Err(e.into());
            }
        }

        if let Err(e) = self.log.append(entry) {
            self.restore_balance(prior_balance);
            if let Some(allocation) = prior_allocation {
                if let Err(restore_err) = self.allocations.write(allocation) {
                    INVARIANT_VIOLATIONS.inc();
                    error!(error = %restore_err, "allocation rollback failed after rejected append");
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    fn restore_balance(&self, prior: &GroupTokenBalance) {
        if let Err(e) = self.balances.write(prior.clone()) {
            INVARIANT_VIOLATIONS.inc();
            error!(error = %e, "balance rollback failed after aborted commit");
        }
    }

    /// Handle a floored backing release: warn by default, abort when
    /// strict reconciliation is configured.
    fn reconcile_clamp(
        &self,
        shop: &ShopId,
        group: &GroupId,
        requested: Decimal,
        released: Decimal,
    ) -> Result<(), LedgerError> {
        if self.config.strict_reconciliation {
            return Err(self.track_invariant(LedgerError::InvariantViolation {
                detail: format!(
                    "backing release for {shop}/{group} floored: requested {requested}, usage covered {released}"
                ),
            }));
        }

        BACKING_CLAMPS.inc();
        warn!(
            shop = %shop,
            group = %group,
            requested = %requested,
            released = %released,
            "backing release floored at zero; recorded usage was inconsistent"
        );
        Ok(())
    }

    fn ensure_positive(&self, operation: &str, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            LEDGER_REJECTIONS
                .with_label_values(&[operation, "invalid_amount"])
                .inc();
            return Err(LedgerError::InvalidAmount { amount });
        }
        Ok(())
    }

    fn track_invariant(&self, err: LedgerError) -> LedgerError {
        if let LedgerError::InvariantViolation { detail } = &err {
            INVARIANT_VIOLATIONS.inc();
            error!(detail = %detail, "ledger invariant violation");
        }
        err
    }
}

fn allocation_invariant(err: AllocationError) -> LedgerError {
    LedgerError::InvariantViolation {
        detail: err.to_string(),
    }
}
