//! # Coalition Ledger Test Suite
//!
//! Unified test crate covering behavior that spans crates:
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Stack fixtures shared by every module
//! └── integration/
//!     ├── scenarios.rs  # End-to-end earn/redeem/allocate flows
//!     ├── concurrency.rs# Same-key serialization, lost-update checks
//!     └── audit.rs      # Replay law and conservation under load
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p coalition-tests
//! cargo test -p coalition-tests integration::concurrency::
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
