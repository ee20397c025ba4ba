//! In-memory balance store and transaction log.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use shared_types::{CustomerAddress, GroupId, Page, PageRequest, StoreError};
use uuid::Uuid;

use crate::domain::entities::{
    BalanceKey, GroupTokenBalance, GroupTokenTransaction, TransactionKind,
};
use crate::ports::stores::{BalanceStore, TransactionLog};

/// HashMap-backed implementation of `BalanceStore`.
///
/// The interior `RwLock` guards map structure only; row-level
/// serialization is the coordinator's job via its keyed lock table.
#[derive(Default)]
pub struct InMemoryBalanceStore {
    rows: RwLock<HashMap<BalanceKey, GroupTokenBalance>>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn get(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Option<GroupTokenBalance>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows.get(&(customer.clone(), group.clone())).cloned())
    }

    fn get_or_create(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<GroupTokenBalance, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows
            .entry((customer.clone(), group.clone()))
            .or_insert_with(|| GroupTokenBalance::new(customer.clone(), group.clone()))
            .clone())
    }

    fn write(&self, record: GroupTokenBalance) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        rows.insert(
            (record.customer_address.clone(), record.group_id.clone()),
            record,
        );
        Ok(())
    }

    fn list_for_customer(
        &self,
        customer: &CustomerAddress,
    ) -> Result<Vec<GroupTokenBalance>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut result: Vec<_> = rows
            .values()
            .filter(|r| &r.customer_address == customer)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        Ok(result)
    }
}

/// Vec-backed implementation of `TransactionLog`.
///
/// Entries are kept in append order; listings serve newest first.
#[derive(Default)]
pub struct InMemoryTransactionLog {
    inner: RwLock<LogInner>,
}

#[derive(Default)]
struct LogInner {
    entries: Vec<GroupTokenTransaction>,
    seen_ids: HashSet<Uuid>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all groups.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, entry: GroupTokenTransaction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if !inner.seen_ids.insert(entry.id) {
            return Err(StoreError::DuplicateEntry {
                id: entry.id.to_string(),
            });
        }
        inner.entries.push(entry);
        Ok(())
    }

    fn list_by_group(
        &self,
        group: &GroupId,
        kind: Option<TransactionKind>,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let matching: Vec<_> = inner
            .entries
            .iter()
            .rev()
            .filter(|e| &e.group_id == group && kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        Ok(Page::from_slice(matching, page))
    }

    fn list_by_customer_in_group(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let matching: Vec<_> = inner
            .entries
            .iter()
            .rev()
            .filter(|e| &e.group_id == group && &e.customer_address == customer)
            .cloned()
            .collect();
        Ok(Page::from_slice(matching, page))
    }

    fn snapshot_group(&self, group: &GroupId) -> Result<Vec<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| &e.group_id == group)
            .cloned()
            .collect())
    }

    fn snapshot_customer(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Vec<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| &e.group_id == group && &e.customer_address == customer)
            .cloned()
            .collect())
    }
}
