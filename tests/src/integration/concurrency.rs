//! Same-key serialization and isolation across keys.

#[cfg(test)]
mod tests {
    use crate::support::{customer, group, shop, stack};
    use cl_01_rcn_allocation::AllocationStore;
    use rust_decimal_macros::dec;
    use shared_types::Decimal;

    /// Many concurrent earns on one (customer, group) must all land: the
    /// final balance is exactly the sum, with one log entry each.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_earns_on_one_key_lose_no_updates() {
        let stack = stack(dec!(10000), &["shop-1"]);
        let (s, g, c) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        stack.allocator.allocate(&s, &g, dec!(1000)).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = stack.ledger.clone();
                let (s, g, c) = (s.clone(), g.clone(), c.clone());
                tokio::spawn(async move {
                    ledger.earn(&s, &g, &c, dec!(5), None, None).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let balance = stack.ledger.balance(&c, &g).unwrap().unwrap();
        assert_eq!(balance.balance, dec!(80));
        assert_eq!(balance.lifetime_earned, dec!(80));

        let allocation = stack.allocation_store.get(&s, &g).unwrap().unwrap();
        assert_eq!(allocation.used_rcn, dec!(40));

        let report = stack.ledger.verify_replay(&c, &g).unwrap();
        assert!(report.consistent, "{:?}", report.first_discrepancy);
        assert_eq!(report.entries_replayed, 16);
    }

    /// Earns and redeems interleaving on the same key still serialize;
    /// nothing is lost and the balance never goes negative.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn interleaved_earns_and_redeems_serialize() {
        let stack = stack(dec!(10000), &["shop-1"]);
        let (s, g, c) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        stack.allocator.allocate(&s, &g, dec!(1000)).await.unwrap();
        // Seed a balance so early redeems have something to take.
        stack
            .ledger
            .earn(&s, &g, &c, dec!(400), None, None)
            .await
            .unwrap();

        let tasks: Vec<_> = (0..12)
            .map(|i| {
                let ledger = stack.ledger.clone();
                let (s, g, c) = (s.clone(), g.clone(), c.clone());
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        ledger.earn(&s, &g, &c, dec!(10), None, None).await.unwrap();
                    } else {
                        ledger
                            .redeem(&s, &g, &c, dec!(10), None, None)
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let balance = stack.ledger.balance(&c, &g).unwrap().unwrap();
        assert_eq!(balance.balance, dec!(400));
        assert_eq!(balance.lifetime_earned, dec!(460));
        assert_eq!(balance.lifetime_redeemed, dec!(60));
        assert!(balance.balance >= Decimal::ZERO);

        let allocation = stack.allocation_store.get(&s, &g).unwrap().unwrap();
        assert_eq!(allocation.used_rcn, dec!(200));
        assert_eq!(
            allocation.allocated_rcn,
            allocation.used_rcn + allocation.available_rcn()
        );

        let report = stack.ledger.verify_replay(&c, &g).unwrap();
        assert!(report.consistent, "{:?}", report.first_discrepancy);
    }

    /// Operations on disjoint keys run concurrently and never corrupt one
    /// another.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn disjoint_keys_are_isolated() {
        let stack = stack(dec!(10000), &["shop-1"]);
        let (s, g) = (shop("shop-1"), group("group-1"));

        stack.allocator.allocate(&s, &g, dec!(1000)).await.unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let ledger = stack.ledger.clone();
                let (s, g) = (s.clone(), g.clone());
                tokio::spawn(async move {
                    let c = customer(&format!("0xcustomer-{i}"));
                    let amount = Decimal::from(i + 1);
                    ledger.earn(&s, &g, &c, amount, None, None).await.unwrap();
                    c
                })
            })
            .collect();

        for (i, task) in tasks.into_iter().enumerate() {
            let c = task.await.unwrap();
            let balance = stack.ledger.balance(&c, &g).unwrap().unwrap();
            assert_eq!(balance.balance, Decimal::from(i + 1));
        }

        // 1+2+..+10 = 55 tokens issued, consuming 27.5 RCN.
        let allocation = stack.allocation_store.get(&s, &g).unwrap().unwrap();
        assert_eq!(allocation.used_rcn, dec!(27.5));
    }

    /// Concurrent earns racing for the last of the backing: some succeed,
    /// the rest fail `InsufficientBacking`, and issuance never exceeds
    /// what the collateral covers.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn overissuance_race_is_lost_by_somebody() {
        let stack = stack(dec!(10000), &["shop-1"]);
        let (s, g, c) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        // Backing for exactly 4 earns of 10 tokens.
        stack.allocator.allocate(&s, &g, dec!(20)).await.unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let ledger = stack.ledger.clone();
                let (s, g, c) = (s.clone(), g.clone(), c.clone());
                tokio::spawn(
                    async move { ledger.earn(&s, &g, &c, dec!(10), None, None).await.is_ok() },
                )
            })
            .collect();

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 4);
        let balance = stack.ledger.balance(&c, &g).unwrap().unwrap();
        assert_eq!(balance.balance, dec!(40));

        let allocation = stack.allocation_store.get(&s, &g).unwrap().unwrap();
        assert_eq!(allocation.used_rcn, dec!(20));
        assert_eq!(allocation.available_rcn(), Decimal::ZERO);
    }
}
