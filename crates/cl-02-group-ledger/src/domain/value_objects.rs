//! Read-model value objects: receipts, analytics rollups, replay audit.

use serde::{Deserialize, Serialize};
use shared_types::{CustomerAddress, Decimal, GroupId, ShopId, Timestamp};
use uuid::Uuid;

use crate::domain::entities::GroupTokenBalance;

/// Result of a successful earn or redeem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// The balance row after the mutation.
    pub balance: GroupTokenBalance,
    /// Id of the log entry the mutation appended.
    pub transaction_id: Uuid,
}

/// Aggregate activity for one group.
///
/// Computed from lock-free snapshots; figures are eventually consistent
/// with writes in flight at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnalytics {
    pub group_id: GroupId,
    /// Tokens ever issued within the group.
    pub total_earned: Decimal,
    /// Tokens ever redeemed within the group.
    pub total_redeemed: Decimal,
    /// Tokens currently outstanding (earned - redeemed).
    pub outstanding: Decimal,
    /// Log entries recorded for the group.
    pub transaction_count: u64,
    /// Distinct customers that ever transacted in the group.
    pub unique_customers: u64,
    /// Distinct shops that ever transacted in the group.
    pub active_shops: u64,
    /// RCN committed to the group across all shops.
    pub total_allocated_rcn: Decimal,
    /// RCN currently consumed backing outstanding tokens.
    pub total_used_rcn: Decimal,
}

/// Per-shop activity within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopActivity {
    pub shop_id: ShopId,
    /// Earn operations performed by the shop.
    pub earn_count: u64,
    /// Redeem operations performed by the shop.
    pub redeem_count: u64,
    /// Tokens the shop issued.
    pub tokens_issued: Decimal,
    /// Tokens the shop redeemed.
    pub tokens_redeemed: Decimal,
    /// Timestamp of the shop's most recent operation.
    pub last_activity_at: Timestamp,
}

/// One day's activity in a trend query. Days with no activity are
/// included, zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Midnight (UTC) opening the day bucket.
    pub day_start: Timestamp,
    pub earned: Decimal,
    pub redeemed: Decimal,
    pub transaction_count: u64,
}

/// Outcome of replaying a (customer, group)'s log entries from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub customer_address: CustomerAddress,
    pub group_id: GroupId,
    /// Entries replayed, in append order.
    pub entries_replayed: u64,
    /// Balance reconstructed from the log alone.
    pub computed_balance: Decimal,
    /// Balance currently stored on the row (zero if the row is absent).
    pub stored_balance: Decimal,
    /// True when the replayed figure matches the stored row and every
    /// entry's before/after pair chains correctly.
    pub consistent: bool,
    /// First broken link found, if any.
    pub first_discrepancy: Option<String>,
}
