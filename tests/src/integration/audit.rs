//! Audit properties: replay law, conservation, durable journaling.

#[cfg(test)]
mod tests {
    use crate::support::{customer, group, shop, stack};
    use cl_01_rcn_allocation::{AllocationCoordinator, AllocationStore, InMemoryAllocationStore, InMemoryShopBalanceService};
    use cl_02_group_ledger::{
        FileJournal, InMemoryBalanceStore, LedgerConfig, LedgerCoordinator, LedgerError,
        TransactionLog,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal_macros::dec;
    use shared_types::{Decimal, KeyedLockTable, SystemClock};
    use std::path::PathBuf;
    use std::sync::Arc;

    /// A long random mix of earns and redeems leaves every invariant
    /// intact: non-negative balances, the lifetime identity, allocation
    /// conservation, the exact backing ratio, and the replay law.
    #[tokio::test]
    async fn random_operation_mix_preserves_every_invariant() {
        let stack = stack(dec!(100000), &["shop-1"]);
        let (s, g) = (shop("shop-1"), group("group-1"));
        let customers = [customer("0xaa"), customer("0xbb"), customer("0xcc")];

        stack.allocator.allocate(&s, &g, dec!(5000)).await.unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let mut total_earned = Decimal::ZERO;
        let mut total_redeemed = Decimal::ZERO;

        for _ in 0..200 {
            let c = &customers[rng.gen_range(0..customers.len())];
            if rng.gen_bool(0.6) {
                let amount = Decimal::from(rng.gen_range(1..=20u32));
                stack
                    .ledger
                    .earn(&s, &g, c, amount, None, None)
                    .await
                    .unwrap();
                total_earned += amount;
            } else {
                let amount = Decimal::from(rng.gen_range(1..=30u32));
                match stack.ledger.redeem(&s, &g, c, amount, None, None).await {
                    Ok(_) => total_redeemed += amount,
                    Err(LedgerError::InsufficientBalance { .. }) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
        }

        for c in &customers {
            if let Some(balance) = stack.ledger.balance(c, &g).unwrap() {
                assert!(balance.balance >= Decimal::ZERO);
                assert_eq!(
                    balance.balance,
                    balance.lifetime_earned - balance.lifetime_redeemed
                );
                let report = stack.ledger.verify_replay(c, &g).unwrap();
                assert!(report.consistent, "{:?}", report.first_discrepancy);
            }
        }

        let allocation = stack.allocation_store.get(&s, &g).unwrap().unwrap();
        assert_eq!(
            allocation.allocated_rcn,
            allocation.used_rcn + allocation.available_rcn()
        );
        // Single shop, no clamps possible: usage tracks outstanding
        // issuance at exactly the 1:2 ratio.
        assert_eq!(
            allocation.used_rcn,
            (total_earned - total_redeemed) * dec!(0.5)
        );

        let analytics = stack.ledger.group_analytics(&g).unwrap();
        assert_eq!(analytics.total_earned, total_earned);
        assert_eq!(analytics.total_redeemed, total_redeemed);
    }

    fn temp_journal(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "coalition_tests_{}_{}.jsonl",
            test_name,
            std::process::id()
        ))
    }

    /// Entries written through the coordinator survive a process restart
    /// when the log is the durable journal adapter.
    #[tokio::test]
    async fn journal_backed_ledger_survives_restart() {
        let path = temp_journal("restart");
        let _ = std::fs::remove_file(&path);

        let (s, g, c) = (shop("shop-1"), group("group-1"), customer("0xaa"));

        {
            let allocation_store = Arc::new(InMemoryAllocationStore::new());
            let alloc_locks = Arc::new(KeyedLockTable::new());
            let allocator = AllocationCoordinator::new(
                allocation_store.clone(),
                InMemoryShopBalanceService::new().with_balance("shop-1", dec!(1000)),
                alloc_locks.clone(),
            );
            let ledger = LedgerCoordinator::new(
                InMemoryBalanceStore::new(),
                allocation_store,
                FileJournal::open(&path).unwrap(),
                SystemClock,
                LedgerConfig::default(),
                alloc_locks,
            );

            allocator.allocate(&s, &g, dec!(100)).await.unwrap();
            ledger.earn(&s, &g, &c, dec!(60), None, None).await.unwrap();
            ledger
                .redeem(&s, &g, &c, dec!(10), None, None)
                .await
                .unwrap();
        }

        // "Restart": a fresh journal instance replays the same file.
        let journal = FileJournal::open(&path).unwrap();
        let entries = journal.snapshot_customer(&c, &g).unwrap();

        assert_eq!(entries.len(), 2);
        let replayed: Decimal = entries.iter().map(|e| e.signed_amount()).sum();
        assert_eq!(replayed, dec!(50));

        let _ = std::fs::remove_file(&path);
    }
}
