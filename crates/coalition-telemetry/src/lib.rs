//! # coalition-telemetry
//!
//! Observability bootstrap for the Coalition Ledger.
//!
//! ## Components
//!
//! - Structured logging via `tracing-subscriber` (pretty console output in
//!   development, JSON lines in containers)
//! - Prometheus metrics for ledger and allocation activity
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coalition_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("telemetry init failed");
//!     // tracing and metrics are live from here on
//! }
//! ```

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, BACKING_CLAMPS, INVARIANT_VIOLATIONS, LEDGER_REJECTIONS,
    RCN_ALLOCATED, RCN_DEALLOCATED, REGISTRY, TOKENS_EARNED, TOKENS_REDEEMED,
    TRANSACTIONS_RECORDED,
};
pub use tracing_setup::init_telemetry;

use thiserror::Error;

/// Errors raised while bootstrapping telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The tracing subscriber could not be installed.
    #[error("tracing init failed: {0}")]
    TracingInit(String),

    /// A metric could not be registered or encoded.
    #[error("metrics error: {0}")]
    Metrics(String),
}
