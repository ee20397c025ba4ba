//! Ports: store contracts, the inbound API and the membership gate.

pub mod inbound;
pub mod outbound;
pub mod stores;

pub use inbound::*;
pub use outbound::*;
pub use stores::*;
