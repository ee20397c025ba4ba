//! Inbound port: the API surface consumed by the platform's HTTP layer.

use async_trait::async_trait;
use cl_01_rcn_allocation::ShopGroupRcnAllocation;
use shared_types::{CustomerAddress, Decimal, GroupId, Page, PageRequest, ShopId};

use crate::domain::entities::{GroupTokenBalance, GroupTokenTransaction, TransactionKind};
use crate::domain::value_objects::{
    GroupAnalytics, LedgerReceipt, ReplayReport, ShopActivity, TrendPoint,
};
use crate::service::ServiceError;

/// Primary API for group token operations.
///
/// Mutating operations are membership-gated; reads pass through ungated
/// and are eventually consistent.
#[async_trait]
pub trait GroupTokenLedgerApi: Send + Sync {
    // === Mutations ===

    async fn earn(
        &self,
        shop: &ShopId,
        group: &GroupId,
        customer: &CustomerAddress,
        amount: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerReceipt, ServiceError>;

    async fn redeem(
        &self,
        shop: &ShopId,
        group: &GroupId,
        customer: &CustomerAddress,
        amount: Decimal,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerReceipt, ServiceError>;

    async fn allocate(
        &self,
        shop: &ShopId,
        group: &GroupId,
        amount: Decimal,
    ) -> Result<ShopGroupRcnAllocation, ServiceError>;

    async fn deallocate(
        &self,
        shop: &ShopId,
        group: &GroupId,
        amount: Decimal,
    ) -> Result<ShopGroupRcnAllocation, ServiceError>;

    // === Balance Reads ===

    fn balance(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Option<GroupTokenBalance>, ServiceError>;

    fn customer_balances(
        &self,
        customer: &CustomerAddress,
    ) -> Result<Vec<GroupTokenBalance>, ServiceError>;

    // === Allocation Reads ===

    fn allocation(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<Option<ShopGroupRcnAllocation>, ServiceError>;

    fn shop_allocations(&self, shop: &ShopId)
        -> Result<Vec<ShopGroupRcnAllocation>, ServiceError>;

    fn group_allocations(
        &self,
        group: &GroupId,
    ) -> Result<Vec<ShopGroupRcnAllocation>, ServiceError>;

    // === Transaction Log ===

    fn group_transactions(
        &self,
        group: &GroupId,
        kind: Option<TransactionKind>,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, ServiceError>;

    fn customer_transactions(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, ServiceError>;

    // === Analytics & Audit ===

    fn group_analytics(&self, group: &GroupId) -> Result<GroupAnalytics, ServiceError>;

    fn member_activity(&self, group: &GroupId) -> Result<Vec<ShopActivity>, ServiceError>;

    fn transaction_trends(
        &self,
        group: &GroupId,
        days: u32,
    ) -> Result<Vec<TrendPoint>, ServiceError>;

    fn verify_replay(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<ReplayReport, ServiceError>;
}
