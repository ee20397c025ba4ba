//! Shared fixtures: a fully wired in-memory ledger stack.

use std::sync::Arc;

use cl_01_rcn_allocation::{
    AllocationCoordinator, AllocationKey, InMemoryAllocationStore, InMemoryShopBalanceService,
};
use cl_02_group_ledger::{
    GroupTokenService, InMemoryBalanceStore, InMemoryMembershipGate, InMemoryTransactionLog,
    LedgerConfig, LedgerCoordinator,
};
use shared_types::{CustomerAddress, Decimal, GroupId, KeyedLockTable, ShopId, SystemClock};

pub type TestLedger = LedgerCoordinator<
    InMemoryBalanceStore,
    Arc<InMemoryAllocationStore>,
    InMemoryTransactionLog,
    SystemClock,
>;

pub type TestAllocator =
    AllocationCoordinator<Arc<InMemoryAllocationStore>, InMemoryShopBalanceService>;

pub type TestService = GroupTokenService<
    InMemoryBalanceStore,
    Arc<InMemoryAllocationStore>,
    InMemoryTransactionLog,
    SystemClock,
    InMemoryShopBalanceService,
    InMemoryMembershipGate,
>;

/// Coordinator-level stack, for tests that drive the ledger directly.
pub struct Stack {
    pub ledger: Arc<TestLedger>,
    pub allocator: Arc<TestAllocator>,
    pub allocation_store: Arc<InMemoryAllocationStore>,
    pub alloc_locks: Arc<KeyedLockTable<AllocationKey>>,
}

/// Build a stack whose shops each start with `shop_funds` of main-currency
/// balance.
pub fn stack(shop_funds: Decimal, shops: &[&str]) -> Stack {
    stack_with_config(shop_funds, shops, LedgerConfig::default())
}

/// Same, with an explicit ledger configuration.
pub fn stack_with_config(shop_funds: Decimal, shops: &[&str], config: LedgerConfig) -> Stack {
    let allocation_store = Arc::new(InMemoryAllocationStore::new());
    let alloc_locks = Arc::new(KeyedLockTable::new());

    let mut shop_balances = InMemoryShopBalanceService::new();
    for shop in shops {
        shop_balances = shop_balances.with_balance(*shop, shop_funds);
    }

    let ledger = Arc::new(LedgerCoordinator::new(
        InMemoryBalanceStore::new(),
        allocation_store.clone(),
        InMemoryTransactionLog::new(),
        SystemClock,
        config,
        alloc_locks.clone(),
    ));
    let allocator = Arc::new(AllocationCoordinator::new(
        allocation_store.clone(),
        shop_balances,
        alloc_locks.clone(),
    ));

    Stack {
        ledger,
        allocator,
        allocation_store,
        alloc_locks,
    }
}

/// Build the membership-gated facade with every shop in `shops` enrolled
/// in `group` and funded with `shop_funds`.
pub fn service(shop_funds: Decimal, shops: &[&str], group: &str) -> TestService {
    let allocation_store = Arc::new(InMemoryAllocationStore::new());
    let alloc_locks = Arc::new(KeyedLockTable::new());

    let mut shop_balances = InMemoryShopBalanceService::new();
    for shop in shops {
        shop_balances = shop_balances.with_balance(*shop, shop_funds);
    }

    let membership = InMemoryMembershipGate::new();
    for shop in shops {
        membership.grant(*shop, group);
    }

    GroupTokenService::new(
        LedgerCoordinator::new(
            InMemoryBalanceStore::new(),
            allocation_store.clone(),
            InMemoryTransactionLog::new(),
            SystemClock,
            LedgerConfig::default(),
            alloc_locks.clone(),
        ),
        AllocationCoordinator::new(allocation_store, shop_balances, alloc_locks),
        membership,
    )
}

pub fn shop(name: &str) -> ShopId {
    ShopId::from(name)
}

pub fn group(name: &str) -> GroupId {
    GroupId::from(name)
}

pub fn customer(name: &str) -> CustomerAddress {
    CustomerAddress::from(name)
}
