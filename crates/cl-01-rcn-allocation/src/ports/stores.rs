//! Allocation store port.

use crate::domain::entities::ShopGroupRcnAllocation;
use shared_types::{GroupId, ShopId, StoreError};
use std::sync::Arc;

/// Persistence contract for allocation rows.
///
/// Writes happen only while the coordinator holds the row lock for the
/// record's (shop, group) key; reads without the lock are snapshot reads
/// and may observe a row mid-update by another key's standards but never a
/// torn record.
pub trait AllocationStore: Send + Sync {
    /// Fetch a row, or `None` if the shop has never allocated to the group.
    fn get(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<Option<ShopGroupRcnAllocation>, StoreError>;

    /// Fetch a row, creating a zeroed one if absent. Idempotent.
    fn get_or_create(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<ShopGroupRcnAllocation, StoreError>;

    /// Persist a row keyed by its (shop, group) identity.
    fn write(&self, record: ShopGroupRcnAllocation) -> Result<(), StoreError>;

    /// All allocations held by one shop, across groups.
    fn list_for_shop(&self, shop: &ShopId) -> Result<Vec<ShopGroupRcnAllocation>, StoreError>;

    /// All allocations backing one group, across shops.
    fn list_for_group(&self, group: &GroupId) -> Result<Vec<ShopGroupRcnAllocation>, StoreError>;
}

// The allocation store is shared between the allocation coordinator and
// the group ledger (which writes `used_rcn`), so `Arc<S>` must satisfy the
// port wherever `S` does.
impl<T: AllocationStore + ?Sized> AllocationStore for Arc<T> {
    fn get(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<Option<ShopGroupRcnAllocation>, StoreError> {
        (**self).get(shop, group)
    }

    fn get_or_create(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<ShopGroupRcnAllocation, StoreError> {
        (**self).get_or_create(shop, group)
    }

    fn write(&self, record: ShopGroupRcnAllocation) -> Result<(), StoreError> {
        (**self).write(record)
    }

    fn list_for_shop(&self, shop: &ShopId) -> Result<Vec<ShopGroupRcnAllocation>, StoreError> {
        (**self).list_for_shop(shop)
    }

    fn list_for_group(&self, group: &GroupId) -> Result<Vec<ShopGroupRcnAllocation>, StoreError> {
        (**self).list_for_group(group)
    }
}
