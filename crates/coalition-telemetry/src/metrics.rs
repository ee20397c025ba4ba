//! Prometheus metrics for the Coalition Ledger.
//!
//! All metrics follow the naming convention: `cl_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // GROUP LEDGER METRICS
    // =========================================================================

    /// Total group tokens issued across all groups
    pub static ref TOKENS_EARNED: Counter = Counter::new(
        "cl_ledger_tokens_earned_total",
        "Total group tokens issued to customers"
    ).expect("metric creation failed");

    /// Total group tokens redeemed across all groups
    pub static ref TOKENS_REDEEMED: Counter = Counter::new(
        "cl_ledger_tokens_redeemed_total",
        "Total group tokens redeemed by customers"
    ).expect("metric creation failed");

    /// Transaction log entries appended
    pub static ref TRANSACTIONS_RECORDED: IntCounter = IntCounter::new(
        "cl_ledger_transactions_recorded_total",
        "Total transaction log entries appended"
    ).expect("metric creation failed");

    /// Rejected ledger operations by operation and reason
    pub static ref LEDGER_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("cl_ledger_rejections_total", "Rejected ledger operations"),
        &["operation", "reason"]  // operation: earn/redeem/allocate/deallocate
    ).expect("metric creation failed");

    /// Invariant violations detected (any count above zero needs attention)
    pub static ref INVARIANT_VIOLATIONS: IntCounter = IntCounter::new(
        "cl_ledger_invariant_violations_total",
        "Internal consistency check failures"
    ).expect("metric creation failed");

    /// Defensive floor clamps applied while releasing backing on redeem
    pub static ref BACKING_CLAMPS: IntCounter = IntCounter::new(
        "cl_ledger_backing_clamps_total",
        "Times a backing release was floored at zero"
    ).expect("metric creation failed");

    // =========================================================================
    // RCN ALLOCATION METRICS
    // =========================================================================

    /// Total RCN committed as group backing
    pub static ref RCN_ALLOCATED: Counter = Counter::new(
        "cl_allocation_rcn_allocated_total",
        "Total RCN collateral committed to groups"
    ).expect("metric creation failed");

    /// Total RCN returned to shop main balances
    pub static ref RCN_DEALLOCATED: Counter = Counter::new(
        "cl_allocation_rcn_deallocated_total",
        "Total RCN collateral returned to shops"
    ).expect("metric creation failed");
}

/// Register all ledger metrics with the global registry.
///
/// Safe to call once at startup; a second call reports the duplicate
/// registration as an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TOKENS_EARNED.clone()),
        Box::new(TOKENS_REDEEMED.clone()),
        Box::new(TRANSACTIONS_RECORDED.clone()),
        Box::new(LEDGER_REJECTIONS.clone()),
        Box::new(INVARIANT_VIOLATIONS.clone()),
        Box::new(BACKING_CLAMPS.clone()),
        Box::new(RCN_ALLOCATED.clone()),
        Box::new(RCN_DEALLOCATED.clone()),
    ];

    for collector in collectors {
        REGISTRY
            .register(collector)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    }
    Ok(())
}

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;

    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}
