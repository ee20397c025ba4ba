//! Ledger entities.
//!
//! ## Type Decisions
//!
//! - Amounts are `rust_decimal::Decimal`. The 1:2 backing ratio makes
//!   half-unit figures routine, and replaying thousands of entries must
//!   reproduce balances exactly, so floats are off the table.
//! - Balance rows carry their own lifetime counters; the identity
//!   `balance == lifetime_earned - lifetime_redeemed` is re-checked on
//!   every transition rather than assumed.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use shared_types::{CustomerAddress, Decimal, GroupId, ShopId, Timestamp};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::errors::LedgerError;

/// RCN consumed per group token issued: the platform's 1:2 ratio.
pub const BACKING_RATIO: Decimal = dec!(0.5);

/// Row key for a balance record.
pub type BalanceKey = (CustomerAddress, GroupId);

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// RCN backing consumed per token issued.
    pub backing_ratio: Decimal,
    /// Bounded wait for a row lock before the operation fails `Busy`.
    pub lock_wait: Duration,
    /// Upper bound applied to requested page sizes.
    pub max_page_size: u32,
    /// Treat a floored backing release on redeem as an invariant
    /// violation instead of a warn-logged correction.
    pub strict_reconciliation: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backing_ratio: BACKING_RATIO,
            lock_wait: Duration::from_secs(5),
            max_page_size: 100,
            strict_reconciliation: false,
        }
    }
}

/// A customer's token balance within one affiliate group.
///
/// Created lazily on first earn, zeroed, and never deleted; a row at zero
/// balance stays behind for audit. Mutated only by the ledger coordinator
/// while the row lock is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTokenBalance {
    /// Owning customer.
    pub customer_address: CustomerAddress,
    /// Scoping group.
    pub group_id: GroupId,
    /// Current spendable balance.
    pub balance: Decimal,
    /// Total ever earned. Monotonically non-decreasing.
    pub lifetime_earned: Decimal,
    /// Total ever redeemed. Monotonically non-decreasing.
    pub lifetime_redeemed: Decimal,
    /// Timestamp of the last applied transaction.
    pub last_transaction_at: Timestamp,
}

impl GroupTokenBalance {
    /// A zeroed row for a (customer, group) pair.
    pub fn new(customer_address: CustomerAddress, group_id: GroupId) -> Self {
        Self {
            customer_address,
            group_id,
            balance: Decimal::ZERO,
            lifetime_earned: Decimal::ZERO,
            lifetime_redeemed: Decimal::ZERO,
            last_transaction_at: 0,
        }
    }

    /// Apply an earn of `amount` at `now`.
    pub fn credit(&mut self, amount: Decimal, now: Timestamp) -> Result<(), LedgerError> {
        self.balance += amount;
        self.lifetime_earned += amount;
        self.last_transaction_at = now;
        self.check()
    }

    /// Apply a redemption of `amount` at `now`.
    ///
    /// The coordinator rejects `amount > balance` as `InsufficientBalance`
    /// before calling this; a debit that still drives the row negative is
    /// an invariant violation, not a business error.
    pub fn debit(&mut self, amount: Decimal, now: Timestamp) -> Result<(), LedgerError> {
        self.balance -= amount;
        self.lifetime_redeemed += amount;
        self.last_transaction_at = now;
        self.check()
    }

    fn check(&self) -> Result<(), LedgerError> {
        if self.balance < Decimal::ZERO
            || self.lifetime_earned < Decimal::ZERO
            || self.lifetime_redeemed < Decimal::ZERO
            || self.balance != self.lifetime_earned - self.lifetime_redeemed
        {
            return Err(LedgerError::InvariantViolation {
                detail: format!(
                    "balance row {}/{} inconsistent: balance={} earned={} redeemed={}",
                    self.customer_address,
                    self.group_id,
                    self.balance,
                    self.lifetime_earned,
                    self.lifetime_redeemed
                ),
            });
        }
        Ok(())
    }
}

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Tokens issued to a customer, consuming backing.
    Earn,
    /// Tokens redeemed by a customer, releasing backing.
    Redeem,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Earn => f.write_str("earn"),
            TransactionKind::Redeem => f.write_str("redeem"),
        }
    }
}

/// One immutable entry in the append-only transaction log.
///
/// The entry is the sole causal link between a balance mutation and an
/// allocation mutation: replaying a (customer, group)'s entries from zero
/// reproduces the balance row exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTokenTransaction {
    /// Opaque unique id.
    pub id: Uuid,
    /// Scoping group.
    pub group_id: GroupId,
    /// Customer whose balance moved.
    pub customer_address: CustomerAddress,
    /// Shop that performed the operation.
    pub shop_id: ShopId,
    /// Earn or redeem.
    pub kind: TransactionKind,
    /// Positive token amount.
    pub amount: Decimal,
    /// Balance before the mutation.
    pub balance_before: Decimal,
    /// Balance after the mutation.
    pub balance_after: Decimal,
    /// Optional caller-supplied reason.
    pub reason: Option<String>,
    /// Arbitrary caller-supplied metadata.
    pub metadata: Option<serde_json::Value>,
    /// When the entry was written.
    pub timestamp: Timestamp,
}

impl GroupTokenTransaction {
    /// Build an earn entry; `balance_after = balance_before + amount`.
    #[allow(clippy::too_many_arguments)]
    pub fn earn(
        group_id: GroupId,
        customer_address: CustomerAddress,
        shop_id: ShopId,
        amount: Decimal,
        balance_before: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            customer_address,
            shop_id,
            kind: TransactionKind::Earn,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            reason,
            metadata,
            timestamp,
        }
    }

    /// Build a redeem entry; `balance_after = balance_before - amount`.
    #[allow(clippy::too_many_arguments)]
    pub fn redeem(
        group_id: GroupId,
        customer_address: CustomerAddress,
        shop_id: ShopId,
        amount: Decimal,
        balance_before: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            customer_address,
            shop_id,
            kind: TransactionKind::Redeem,
            amount,
            balance_before,
            balance_after: balance_before - amount,
            reason,
            metadata,
            timestamp,
        }
    }

    /// Contribution of this entry to a replayed balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Earn => self.amount,
            TransactionKind::Redeem => -self.amount,
        }
    }
}
