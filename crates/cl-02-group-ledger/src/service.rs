//! # Group Token Service
//!
//! The facade the platform layer consumes. Applies the membership
//! precondition before mutating operations, then delegates to the
//! coordinators; the coordinators themselves never re-validate it.
//!
//! `deallocate` is deliberately ungated: a shop that has left a group
//! must still be able to withdraw its unused collateral.

use async_trait::async_trait;
use cl_01_rcn_allocation::{
    AllocationCoordinator, AllocationError, AllocationStore, ShopBalanceService,
    ShopGroupRcnAllocation,
};
use shared_types::{Clock, CustomerAddress, Decimal, GroupId, Page, PageRequest, ShopId};
use thiserror::Error;
use tracing::warn;

use crate::coordinator::LedgerCoordinator;
use crate::domain::entities::{GroupTokenBalance, GroupTokenTransaction, TransactionKind};
use crate::domain::errors::LedgerError;
use crate::domain::value_objects::{
    GroupAnalytics, LedgerReceipt, ReplayReport, ShopActivity, TrendPoint,
};
use crate::ports::inbound::GroupTokenLedgerApi;
use crate::ports::outbound::GroupMembershipGate;
use crate::ports::stores::{BalanceStore, TransactionLog};

/// Errors surfaced by the facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("shop {shop} is not an active member of group {group}")]
    NotAnActiveMember { shop: ShopId, group: GroupId },

    #[error("membership check failed: {message}")]
    MembershipUnavailable { message: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Membership-gated facade over the ledger and allocation coordinators.
pub struct GroupTokenService<B, A, L, C, S, M>
where
    B: BalanceStore,
    A: AllocationStore,
    L: TransactionLog,
    C: Clock,
    S: ShopBalanceService,
    M: GroupMembershipGate,
{
    ledger: LedgerCoordinator<B, A, L, C>,
    allocations: AllocationCoordinator<A, S>,
    membership: M,
}

impl<B, A, L, C, S, M> GroupTokenService<B, A, L, C, S, M>
where
    B: BalanceStore,
    A: AllocationStore,
    L: TransactionLog,
    C: Clock,
    S: ShopBalanceService,
    M: GroupMembershipGate,
{
    /// Assemble the facade. Both coordinators must share the same
    /// allocation store and allocation lock table.
    pub fn new(
        ledger: LedgerCoordinator<B, A, L, C>,
        allocations: AllocationCoordinator<A, S>,
        membership: M,
    ) -> Self {
        Self {
            ledger,
            allocations,
            membership,
        }
    }

    async fn gate(&self, shop: &ShopId, group: &GroupId) -> Result<(), ServiceError> {
        let active = self
            .membership
            .is_shop_active_member(shop, group)
            .await
            .map_err(|e| ServiceError::MembershipUnavailable {
                message: e.to_string(),
            })?;

        if !active {
            warn!(shop = %shop, group = %group, "operation rejected: not an active member");
            return Err(ServiceError::NotAnActiveMember {
                shop: shop.clone(),
                group: group.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<B, A, L, C, S, M> GroupTokenLedgerApi for GroupTokenService<B, A, L, C, S, M>
where
    B: BalanceStore,
    A: AllocationStore,
    L: TransactionLog,
    C: Clock,
    S: ShopBalanceService,
    M: GroupMembershipGate,
{
    async fn earn(
        &self,
        shop: &ShopId,
        group: &GroupId,
        customer: &CustomerAddress,
        amount: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerReceipt, ServiceError> {
        self.gate(shop, group).await?;
        Ok(self
            .ledger
            .earn(shop, group, customer, amount, reason, metadata)
            .await?)
    }

    async fn redeem(
        &self,
        shop: &ShopId,
        group: &GroupId,
        customer: &CustomerAddress,
        amount: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerReceipt, ServiceError> {
        self.gate(shop, group).await?;
        Ok(self
            .ledger
            .redeem(shop, group, customer, amount, reason, metadata)
            .await?)
    }

    async fn allocate(
        &self,
        shop: &ShopId,
        group: &GroupId,
        amount: Decimal,
    ) -> Result<ShopGroupRcnAllocation, ServiceError> {
        self.gate(shop, group).await?;
        Ok(self.allocations.allocate(shop, group, amount).await?)
    }

    async fn deallocate(
        &self,
        shop: &ShopId,
        group: &GroupId,
        amount: Decimal,
    ) -> Result<ShopGroupRcnAllocation, ServiceError> {
        Ok(self.allocations.deallocate(shop, group, amount).await?)
    }

    fn balance(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Option<GroupTokenBalance>, ServiceError> {
        Ok(self.ledger.balance(customer, group)?)
    }

    fn customer_balances(
        &self,
        customer: &CustomerAddress,
    ) -> Result<Vec<GroupTokenBalance>, ServiceError> {
        Ok(self.ledger.customer_balances(customer)?)
    }

    fn allocation(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<Option<ShopGroupRcnAllocation>, ServiceError> {
        Ok(self.allocations.allocation(shop, group)?)
    }

    fn shop_allocations(
        &self,
        shop: &ShopId,
    ) -> Result<Vec<ShopGroupRcnAllocation>, ServiceError> {
        Ok(self.allocations.shop_allocations(shop)?)
    }

    fn group_allocations(
        &self,
        group: &GroupId,
    ) -> Result<Vec<ShopGroupRcnAllocation>, ServiceError> {
        Ok(self.allocations.group_allocations(group)?)
    }

    fn group_transactions(
        &self,
        group: &GroupId,
        kind: Option<TransactionKind>,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, ServiceError> {
        Ok(self.ledger.group_transactions(group, kind, page)?)
    }

    fn customer_transactions(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, ServiceError> {
        Ok(self.ledger.customer_transactions(customer, group, page)?)
    }

    fn group_analytics(&self, group: &GroupId) -> Result<GroupAnalytics, ServiceError> {
        Ok(self.ledger.group_analytics(group)?)
    }

    fn member_activity(&self, group: &GroupId) -> Result<Vec<ShopActivity>, ServiceError> {
        Ok(self.ledger.member_activity(group)?)
    }

    fn transaction_trends(
        &self,
        group: &GroupId,
        days: u32,
    ) -> Result<Vec<TrendPoint>, ServiceError> {
        Ok(self.ledger.transaction_trends(group, days)?)
    }

    fn verify_replay(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<ReplayReport, ServiceError> {
        Ok(self.ledger.verify_replay(customer, group)?)
    }
}
