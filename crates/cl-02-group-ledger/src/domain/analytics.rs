//! Aggregate queries over transaction-log snapshots.
//!
//! Pure functions: the coordinator hands in a snapshot and gets a rollup
//! back. Nothing here takes a lock, so every figure is eventually
//! consistent by construction.

use std::collections::{BTreeMap, HashSet};

use cl_01_rcn_allocation::ShopGroupRcnAllocation;
use shared_types::{Decimal, GroupId, ShopId, Timestamp};

use crate::domain::entities::{GroupTokenTransaction, TransactionKind};
use crate::domain::value_objects::{GroupAnalytics, ShopActivity, TrendPoint};

/// Seconds per day bucket.
const DAY: u64 = 86_400;

/// Roll up a group's transaction snapshot and allocation rows.
pub fn group_analytics(
    group: &GroupId,
    entries: &[GroupTokenTransaction],
    allocations: &[ShopGroupRcnAllocation],
) -> GroupAnalytics {
    let mut total_earned = Decimal::ZERO;
    let mut total_redeemed = Decimal::ZERO;
    let mut customers: HashSet<&str> = HashSet::new();
    let mut shops: HashSet<&str> = HashSet::new();

    for entry in entries {
        match entry.kind {
            TransactionKind::Earn => total_earned += entry.amount,
            TransactionKind::Redeem => total_redeemed += entry.amount,
        }
        customers.insert(entry.customer_address.as_str());
        shops.insert(entry.shop_id.as_str());
    }

    let (total_allocated_rcn, total_used_rcn) = allocations.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(allocated, used), row| (allocated + row.allocated_rcn, used + row.used_rcn),
    );

    GroupAnalytics {
        group_id: group.clone(),
        total_earned,
        total_redeemed,
        outstanding: total_earned - total_redeemed,
        transaction_count: entries.len() as u64,
        unique_customers: customers.len() as u64,
        active_shops: shops.len() as u64,
        total_allocated_rcn,
        total_used_rcn,
    }
}

/// Per-shop activity within a group, most active shop first.
pub fn member_activity(entries: &[GroupTokenTransaction]) -> Vec<ShopActivity> {
    let mut by_shop: BTreeMap<ShopId, ShopActivity> = BTreeMap::new();

    for entry in entries {
        let activity = by_shop
            .entry(entry.shop_id.clone())
            .or_insert_with(|| ShopActivity {
                shop_id: entry.shop_id.clone(),
                earn_count: 0,
                redeem_count: 0,
                tokens_issued: Decimal::ZERO,
                tokens_redeemed: Decimal::ZERO,
                last_activity_at: 0,
            });

        match entry.kind {
            TransactionKind::Earn => {
                activity.earn_count += 1;
                activity.tokens_issued += entry.amount;
            }
            TransactionKind::Redeem => {
                activity.redeem_count += 1;
                activity.tokens_redeemed += entry.amount;
            }
        }
        activity.last_activity_at = activity.last_activity_at.max(entry.timestamp);
    }

    let mut result: Vec<ShopActivity> = by_shop.into_values().collect();
    result.sort_by(|a, b| {
        (b.earn_count + b.redeem_count)
            .cmp(&(a.earn_count + a.redeem_count))
            .then_with(|| a.shop_id.cmp(&b.shop_id))
    });
    result
}

/// Daily earn/redeem volumes for the trailing `days` days ending at `now`.
///
/// Returns one point per day, oldest first, including zeroed points for
/// quiet days.
pub fn transaction_trends(
    entries: &[GroupTokenTransaction],
    days: u32,
    now: Timestamp,
) -> Vec<TrendPoint> {
    if days == 0 {
        return Vec::new();
    }

    let today_start = (now / DAY) * DAY;
    let window_start = today_start.saturating_sub(DAY * (days as u64 - 1));

    let mut buckets: BTreeMap<Timestamp, TrendPoint> = (0..days as u64)
        .map(|i| {
            let day_start = window_start + i * DAY;
            (
                day_start,
                TrendPoint {
                    day_start,
                    earned: Decimal::ZERO,
                    redeemed: Decimal::ZERO,
                    transaction_count: 0,
                },
            )
        })
        .collect();

    for entry in entries {
        let day_start = (entry.timestamp / DAY) * DAY;
        let Some(point) = buckets.get_mut(&day_start) else {
            continue; // outside the window
        };

        match entry.kind {
            TransactionKind::Earn => point.earned += entry.amount,
            TransactionKind::Redeem => point.redeemed += entry.amount,
        }
        point.transaction_count += 1;
    }

    buckets.into_values().collect()
}
