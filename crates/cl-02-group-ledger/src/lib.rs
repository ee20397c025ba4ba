//! # cl-02-group-ledger
//!
//! Group token ledger for the Coalition Ledger.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: authoritative group-token balance per
//!   (customer, group) pair
//! - **Append-Only Audit Trail**: every successful earn/redeem writes
//!   exactly one immutable `GroupTokenTransaction`
//! - **Backing Enforcement**: issuance consumes RCN collateral from the
//!   shop's allocation row (cl-01) at the platform's 1:2 ratio
//!
//! ## Write Path
//!
//! ```text
//! earn/redeem ──→ [LedgerCoordinator]
//!                    │ lock allocation row, then balance row
//!                    │ validate backing / balance
//!                    ├──→ BalanceStore        (balance row)
//!                    ├──→ AllocationStore     (used_rcn)
//!                    └──→ TransactionLog      (one entry)
//!                 all three writes commit together or not at all
//! ```
//!
//! Reads (balances, listings, analytics, replay audit) are lock-free
//! snapshot reads and are eventually consistent with in-flight writes.

pub mod adapters;
pub mod coordinator;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use coordinator::*;
pub use domain::*;
pub use ports::*;
pub use service::*;
