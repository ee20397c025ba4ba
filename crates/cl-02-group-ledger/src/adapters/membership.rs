//! In-memory membership gate.
//!
//! Production deployments ask the platform's Group Membership service;
//! this adapter backs tests and standalone development.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use shared_types::{GroupId, ShopId};

use crate::ports::outbound::{GroupMembershipGate, MembershipError};

/// Set-backed `GroupMembershipGate`.
#[derive(Default)]
pub struct InMemoryMembershipGate {
    members: RwLock<HashSet<(ShopId, GroupId)>>,
}

impl InMemoryMembershipGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a shop as an active member of a group.
    pub fn grant(&self, shop: impl Into<ShopId>, group: impl Into<GroupId>) {
        if let Ok(mut members) = self.members.write() {
            members.insert((shop.into(), group.into()));
        }
    }

    /// Remove a shop's membership.
    pub fn revoke(&self, shop: &ShopId, group: &GroupId) {
        if let Ok(mut members) = self.members.write() {
            members.remove(&(shop.clone(), group.clone()));
        }
    }
}

#[async_trait]
impl GroupMembershipGate for InMemoryMembershipGate {
    async fn is_shop_active_member(
        &self,
        shop: &ShopId,
        group: &GroupId,
    ) -> Result<bool, MembershipError> {
        let members = self.members.read().map_err(|_| MembershipError {
            message: "membership set poisoned".to_string(),
        })?;
        Ok(members.contains(&(shop.clone(), group.clone())))
    }
}
