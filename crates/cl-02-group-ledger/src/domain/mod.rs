//! Domain layer: balances, transactions, analytics and error taxonomy.

pub mod analytics;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use analytics::*;
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
