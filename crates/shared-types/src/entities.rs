//! # Core Identifiers and Value Types
//!
//! Identity newtypes shared by every ledger crate. Shops, groups and
//! customers are keyed by opaque string identifiers assigned by the
//! platform layer; the ledger never parses them.

use serde::{Deserialize, Serialize};

// Re-export Decimal for use across all ledger crates. Every amount,
// balance and collateral figure is an exact decimal, never a float.
pub use rust_decimal::Decimal;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Unique identifier for a shop on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShopId(pub String);

/// Unique identifier for an affiliate group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub String);

/// A customer's wallet address.
///
/// Addresses are compared case-sensitively; the platform layer is
/// responsible for normalizing casing before they reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerAddress(pub String);

macro_rules! impl_id_conversions {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Borrow the underlying identifier string.
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $ty {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }

            impl From<String> for $ty {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

impl_id_conversions!(ShopId, GroupId, CustomerAddress);
