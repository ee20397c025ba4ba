//! Outbound port: the group membership collaborator.
//!
//! Membership workflow (join/approve/reject) lives outside the ledger; the
//! facade only asks whether a shop currently holds an active membership
//! before letting a mutating operation through. The coordinators never
//! re-validate it.

use async_trait::async_trait;
use shared_types::{GroupId, ShopId};

/// Transport/infrastructure failure talking to the membership service.
#[derive(Debug, thiserror::Error)]
#[error("membership service: {message}")]
pub struct MembershipError {
    pub message: String,
}

/// The Group Membership collaborator.
#[async_trait]
pub trait GroupMembershipGate: Send + Sync {
    /// True when the shop holds an active membership in the group.
    async fn is_shop_active_member(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<bool, MembershipError>;
}
