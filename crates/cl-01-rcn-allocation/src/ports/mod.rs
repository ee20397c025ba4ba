//! Ports: the store contract and the shop-balance collaborator.

pub mod outbound;
pub mod stores;

pub use outbound::*;
pub use stores::*;
