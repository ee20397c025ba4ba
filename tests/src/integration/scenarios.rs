//! End-to-end flows through the membership-gated facade.
//!
//! Walks the canonical earn/redeem/allocate sequences a shop drives in
//! production, asserting balances, backing usage and the audit trail
//! after every step.

#[cfg(test)]
mod tests {
    use crate::support::{customer, group, service, shop, stack_with_config};
    use cl_02_group_ledger::{
        GroupTokenLedgerApi, LedgerConfig, LedgerError, ServiceError, TransactionKind,
    };
    use cl_01_rcn_allocation::AllocationError;
    use rust_decimal_macros::dec;
    use shared_types::{Decimal, PageRequest};
    use std::time::Duration;

    #[tokio::test]
    async fn issuance_is_bounded_by_backing() {
        let service = service(dec!(1000), &["shop-1"], "group-1");
        let (shop, group, customer) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        // 50 RCN of backing covers exactly 100 tokens at the 1:2 ratio.
        service.allocate(&shop, &group, dec!(50)).await.unwrap();

        let receipt = service
            .earn(&shop, &group, &customer, dec!(100), None, None)
            .await
            .unwrap();
        assert_eq!(receipt.balance.balance, dec!(100));

        let allocation = service.allocation(&shop, &group).unwrap().unwrap();
        assert_eq!(allocation.used_rcn, dec!(50));
        assert_eq!(allocation.available_rcn(), Decimal::ZERO);

        // Backing is exhausted; the same earn must now fail and change
        // nothing.
        let err = service
            .earn(&shop, &group, &customer, dec!(100), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::InsufficientBacking { .. })
        ));
        assert_eq!(
            service.balance(&customer, &group).unwrap().unwrap().balance,
            dec!(100)
        );
    }

    #[tokio::test]
    async fn redemption_returns_backing_and_respects_balance() {
        let service = service(dec!(1000), &["shop-1"], "group-1");
        let (shop, group, customer) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        service.allocate(&shop, &group, dec!(50)).await.unwrap();
        service
            .earn(&shop, &group, &customer, dec!(100), None, None)
            .await
            .unwrap();

        let receipt = service
            .redeem(&shop, &group, &customer, dec!(50), None, None)
            .await
            .unwrap();
        assert_eq!(receipt.balance.balance, dec!(50));

        // Half the redeemed amount comes back as available backing.
        let allocation = service.allocation(&shop, &group).unwrap().unwrap();
        assert_eq!(allocation.used_rcn, dec!(25));
        assert_eq!(allocation.available_rcn(), dec!(25));

        // Redemption never goes partial.
        let err = service
            .redeem(&shop, &group, &customer, dec!(999999), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(
            service.balance(&customer, &group).unwrap().unwrap().balance,
            dec!(50)
        );
    }

    #[tokio::test]
    async fn unused_collateral_round_trips() {
        let service = service(dec!(1000), &["shop-1"], "group-1");
        let (shop, group) = (shop("shop-1"), group("group-1"));

        service.allocate(&shop, &group, dec!(200)).await.unwrap();
        let record = service.deallocate(&shop, &group, dec!(200)).await.unwrap();

        assert_eq!(record.allocated_rcn, Decimal::ZERO);
        assert_eq!(record.used_rcn, Decimal::ZERO);
    }

    #[tokio::test]
    async fn collateral_backing_issued_tokens_is_locked_in() {
        let service = service(dec!(1000), &["shop-1"], "group-1");
        let (shop, group, customer) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        service.allocate(&shop, &group, dec!(200)).await.unwrap();
        // 300 tokens consume 150 RCN of backing.
        service
            .earn(&shop, &group, &customer, dec!(300), None, None)
            .await
            .unwrap();

        let err = service
            .deallocate(&shop, &group, dec!(100))
            .await
            .unwrap_err();
        match err {
            ServiceError::Allocation(AllocationError::InsufficientAvailableAllocation {
                requested,
                available,
            }) => {
                assert_eq!(requested, dec!(100));
                assert_eq!(available, dec!(50));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The unused remainder is still returnable.
        let record = service.deallocate(&shop, &group, dec!(50)).await.unwrap();
        assert_eq!(record.allocated_rcn, dec!(150));
        assert_eq!(record.used_rcn, dec!(150));
    }

    #[tokio::test]
    async fn audit_trail_records_one_entry_per_operation() {
        let service = service(dec!(1000), &["shop-1", "shop-2"], "group-1");
        let (s1, s2, g) = (shop("shop-1"), shop("shop-2"), group("group-1"));
        let c = customer("0xaaaa");

        service.allocate(&s1, &g, dec!(100)).await.unwrap();
        service.allocate(&s2, &g, dec!(100)).await.unwrap();
        service.earn(&s1, &g, &c, dec!(80), None, None).await.unwrap();
        service.earn(&s2, &g, &c, dec!(40), None, None).await.unwrap();
        service.redeem(&s1, &g, &c, dec!(20), None, None).await.unwrap();

        let all = service
            .group_transactions(&g, None, PageRequest::first(10))
            .unwrap();
        assert_eq!(all.total, 3);
        // Newest first.
        assert_eq!(all.items[0].kind, TransactionKind::Redeem);

        let redeems = service
            .group_transactions(&g, Some(TransactionKind::Redeem), PageRequest::first(10))
            .unwrap();
        assert_eq!(redeems.total, 1);

        let mine = service
            .customer_transactions(&c, &g, PageRequest::first(2))
            .unwrap();
        assert_eq!(mine.total, 3);
        assert_eq!(mine.items.len(), 2);

        let analytics = service.group_analytics(&g).unwrap();
        assert_eq!(analytics.total_earned, dec!(120));
        assert_eq!(analytics.total_redeemed, dec!(20));
        assert_eq!(analytics.outstanding, dec!(100));
        assert_eq!(analytics.active_shops, 2);
        assert_eq!(analytics.total_allocated_rcn, dec!(200));
        // 60 consumed minus 10 released.
        assert_eq!(analytics.total_used_rcn, dec!(50));

        let activity = service.member_activity(&g).unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].shop_id, shop("shop-1"));
        assert_eq!(activity[0].earn_count, 1);
        assert_eq!(activity[0].redeem_count, 1);

        let report = service.verify_replay(&c, &g).unwrap();
        assert!(report.consistent, "{:?}", report.first_discrepancy);
        assert_eq!(report.computed_balance, dec!(100));
    }

    #[tokio::test]
    async fn contended_row_surfaces_busy_within_the_bounded_wait() {
        let config = LedgerConfig {
            lock_wait: Duration::from_millis(50),
            ..LedgerConfig::default()
        };
        let stack = stack_with_config(dec!(1000), &["shop-1"], config);
        let (shop, group, customer) = (shop("shop-1"), group("group-1"), customer("0xaaaa"));

        stack.allocator.allocate(&shop, &group, dec!(100)).await.unwrap();

        // Park a guard on the allocation row, simulating an in-flight
        // operation.
        let key = (shop.clone(), group.clone());
        let _held = stack
            .alloc_locks
            .acquire(&key, Duration::from_secs(1))
            .await
            .unwrap();

        let err = stack
            .ledger
            .earn(&shop, &group, &customer, dec!(10), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Busy { .. }));

        // The holder was not force-released and the ledger saw no write.
        assert!(stack.ledger.balance(&customer, &group).unwrap().is_none());
    }
}
