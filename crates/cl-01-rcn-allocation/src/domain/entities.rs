//! Allocation records.
//!
//! One `ShopGroupRcnAllocation` exists per (shop, group) pair, created on
//! the shop's first allocation and retained indefinitely. Transitions go
//! through the methods below so the backing invariant is checked on every
//! mutation rather than trusted to callers.

use crate::domain::errors::AllocationError;
use serde::{Deserialize, Serialize};
use shared_types::{Decimal, GroupId, ShopId};

/// Row key for an allocation record.
pub type AllocationKey = (ShopId, GroupId);

/// Collateral a shop has committed to one affiliate group.
///
/// `allocated_rcn` is written only by the allocation coordinator;
/// `used_rcn` only by the group ledger as a side effect of earn/redeem.
/// `available_rcn` is derived on read so the three figures cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopGroupRcnAllocation {
    /// Shop that committed the collateral.
    pub shop_id: ShopId,
    /// Group the collateral backs.
    pub group_id: GroupId,
    /// Total RCN committed by the shop to this group.
    pub allocated_rcn: Decimal,
    /// RCN currently consumed backing outstanding group tokens.
    pub used_rcn: Decimal,
}

/// Result of releasing backing on redeem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackingRelease {
    /// Amount actually subtracted from `used_rcn`.
    pub released: Decimal,
    /// True when the requested release exceeded recorded usage and was
    /// floored at zero.
    pub clamped: bool,
}

impl ShopGroupRcnAllocation {
    /// A zeroed record for a (shop, group) pair.
    pub fn new(shop_id: ShopId, group_id: GroupId) -> Self {
        Self {
            shop_id,
            group_id,
            allocated_rcn: Decimal::ZERO,
            used_rcn: Decimal::ZERO,
        }
    }

    /// Collateral not currently backing issued tokens.
    pub fn available_rcn(&self) -> Decimal {
        self.allocated_rcn - self.used_rcn
    }

    /// Commit `amount` of additional collateral.
    pub fn grant(&mut self, amount: Decimal) -> Result<(), AllocationError> {
        self.allocated_rcn += amount;
        self.check()
    }

    /// Return `amount` of unused collateral to the shop.
    ///
    /// Callers check `amount <= available_rcn` first; this method still
    /// refuses a transition that would leave usage above the commitment.
    pub fn reclaim(&mut self, amount: Decimal) -> Result<(), AllocationError> {
        self.allocated_rcn -= amount;
        self.check()
    }

    /// Consume `amount` of backing for newly issued tokens.
    pub fn consume_backing(&mut self, amount: Decimal) -> Result<(), AllocationError> {
        self.used_rcn += amount;
        self.check()
    }

    /// Release backing freed by a redemption, floored at zero.
    ///
    /// The floor keeps `available_rcn` from ever exceeding
    /// `allocated_rcn`; a triggered floor means recorded usage was already
    /// inconsistent with the redemption and is surfaced via `clamped`.
    pub fn release_backing(&mut self, amount: Decimal) -> BackingRelease {
        let released = amount.min(self.used_rcn);
        self.used_rcn -= released;

        BackingRelease {
            released,
            clamped: released < amount,
        }
    }

    fn check(&self) -> Result<(), AllocationError> {
        if self.allocated_rcn < Decimal::ZERO
            || self.used_rcn < Decimal::ZERO
            || self.used_rcn > self.allocated_rcn
        {
            return Err(AllocationError::InvariantViolation {
                detail: format!(
                    "allocation {}/{} left inconsistent: allocated={} used={}",
                    self.shop_id, self.group_id, self.allocated_rcn, self.used_rcn
                ),
            });
        }
        Ok(())
    }
}
