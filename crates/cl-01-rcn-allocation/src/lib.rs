//! # cl-01-rcn-allocation
//!
//! RCN-backing allocation for the Coalition Ledger.
//!
//! ## Role in System
//!
//! - Tracks the collateral each shop commits to each affiliate group
//!   (`ShopGroupRcnAllocation`, keyed by shop and group)
//! - `AllocationCoordinator` owns the write path to `allocated_rcn`;
//!   the group ledger consumes `used_rcn` as a side effect of earn/redeem
//! - Collateral moves against the shop's main balance through the
//!   `ShopBalanceService` collaborator, never while a row lock is held
//!
//! ## Invariant
//!
//! `0 <= used_rcn <= allocated_rcn` for every allocation row, preserved by
//! every transition. `available_rcn` is always recomputed, never stored.

pub mod adapters;
pub mod coordinator;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use coordinator::*;
pub use domain::*;
pub use ports::*;
