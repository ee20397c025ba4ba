//! In-memory allocation store.

use crate::domain::entities::{AllocationKey, ShopGroupRcnAllocation};
use crate::ports::stores::AllocationStore;
use shared_types::{GroupId, ShopId, StoreError};
use std::collections::HashMap;
use std::sync::RwLock;

/// HashMap-backed implementation of `AllocationStore`.
///
/// The interior `RwLock` guards map structure only; row-level serialization
/// is the coordinator's job via its keyed lock table.
#[derive(Default)]
pub struct InMemoryAllocationStore {
    rows: RwLock<HashMap<AllocationKey, ShopGroupRcnAllocation>>,
}

impl InMemoryAllocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AllocationStore for InMemoryAllocationStore {
    fn get(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<Option<ShopGroupRcnAllocation>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows.get(&(shop.clone(), group.clone())).cloned())
    }

    fn get_or_create(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<ShopGroupRcnAllocation, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows
            .entry((shop.clone(), group.clone()))
            .or_insert_with(|| ShopGroupRcnAllocation::new(shop.clone(), group.clone()))
            .clone())
    }

    fn write(&self, record: ShopGroupRcnAllocation) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        rows.insert((record.shop_id.clone(), record.group_id.clone()), record);
        Ok(())
    }

    fn list_for_shop(&self, shop: &ShopId) -> Result<Vec<ShopGroupRcnAllocation>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut result: Vec<_> = rows
            .values()
            .filter(|r| &r.shop_id == shop)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        Ok(result)
    }

    fn list_for_group(&self, group: &GroupId) -> Result<Vec<ShopGroupRcnAllocation>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut result: Vec<_> = rows
            .values()
            .filter(|r| &r.group_id == group)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.shop_id.cmp(&b.shop_id));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn get_or_create_is_idempotent() {
        let store = InMemoryAllocationStore::new();
        let shop = ShopId::from("shop-1");
        let group = GroupId::from("group-1");

        let first = store.get_or_create(&shop, &group).unwrap();
        let second = store.get_or_create(&shop, &group).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_for_shop(&shop).unwrap().len(), 1);
    }

    #[test]
    fn write_then_get_round_trips() {
        let store = InMemoryAllocationStore::new();
        let shop = ShopId::from("shop-1");
        let group = GroupId::from("group-1");

        let mut record = store.get_or_create(&shop, &group).unwrap();
        record.grant(dec!(150)).unwrap();
        store.write(record.clone()).unwrap();

        assert_eq!(store.get(&shop, &group).unwrap(), Some(record));
    }

    #[test]
    fn listings_filter_by_key_side() {
        let store = InMemoryAllocationStore::new();
        for (shop, group) in [("s1", "g1"), ("s1", "g2"), ("s2", "g1")] {
            store
                .get_or_create(&ShopId::from(shop), &GroupId::from(group))
                .unwrap();
        }

        assert_eq!(store.list_for_shop(&ShopId::from("s1")).unwrap().len(), 2);
        assert_eq!(store.list_for_group(&GroupId::from("g1")).unwrap().len(), 2);
    }
}
