//! Balance store and transaction log ports.

use shared_types::{CustomerAddress, GroupId, Page, PageRequest, StoreError};

use crate::domain::entities::{GroupTokenBalance, GroupTokenTransaction, TransactionKind};

/// Persistence contract for balance rows.
///
/// Writes happen only while the ledger coordinator holds the row lock for
/// the record's (customer, group) key. Reads without the lock are snapshot
/// reads.
pub trait BalanceStore: Send + Sync {
    /// Fetch a row, or `None` if the customer has never earned in the group.
    fn get(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Option<GroupTokenBalance>, StoreError>;

    /// Fetch a row, creating a zeroed one if absent. Idempotent.
    fn get_or_create(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<GroupTokenBalance, StoreError>;

    /// Persist a row keyed by its (customer, group) identity.
    fn write(&self, record: GroupTokenBalance) -> Result<(), StoreError>;

    /// All of a customer's balances, across groups.
    fn list_for_customer(
        &self,
        customer: &CustomerAddress,
    ) -> Result<Vec<GroupTokenBalance>, StoreError>;
}

/// Append-only transaction log.
///
/// Entries are write-once: `append` rejects an id it has seen before, and
/// no update or delete exists in the contract. Appends need no locking
/// beyond the row locks the coordinator already holds; reads never lock.
pub trait TransactionLog: Send + Sync {
    /// Append one entry. Fails `DuplicateEntry` if the id already exists.
    fn append(&self, entry: GroupTokenTransaction) -> Result<(), StoreError>;

    /// A group's entries, newest first, optionally filtered by kind.
    fn list_by_group(
        &self,
        group: &GroupId,
        kind: Option<TransactionKind>,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, StoreError>;

    /// One customer's entries within a group, newest first.
    fn list_by_customer_in_group(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, StoreError>;

    /// Every entry for a group, in append order. Snapshot read.
    fn snapshot_group(&self, group: &GroupId) -> Result<Vec<GroupTokenTransaction>, StoreError>;

    /// Every entry for one (customer, group), in append order. Snapshot read.
    fn snapshot_customer(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Vec<GroupTokenTransaction>, StoreError>;
}
