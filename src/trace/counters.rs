//! Instruction-site rows and throughput counters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::numeric::finite_or_zero;

/// VALU instructions issued (each counted as one FMA)
pub const COUNTER_VALU_INSTS: &str = "SQ_INSTS_VALU";
/// Bytes read through the L2 cache
pub const COUNTER_L2_READ_BYTES: &str = "TCC_READ_BYTES";
/// Bytes written through the L2 cache
pub const COUNTER_L2_WRITE_BYTES: &str = "TCC_WRITE_BYTES";

/// Counters the roofline needs from the collector
pub const ROOFLINE_COUNTERS: [&str; 3] = [
    COUNTER_VALU_INSTS,
    COUNTER_L2_READ_BYTES,
    COUNTER_L2_WRITE_BYTES,
];

/// Per-instruction-site counters aggregated by the trace collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRow {
    #[serde(alias = "isa")]
    pub mnemonic: String,
    #[serde(alias = "hit")]
    pub hit_count: u64,
    #[serde(alias = "latency")]
    pub latency_cycles: u64,
    #[serde(alias = "stall")]
    pub stall_cycles: u64,
    #[serde(alias = "idle")]
    pub idle_cycles: u64,
}

impl InstructionRow {
    pub fn new(
        mnemonic: impl Into<String>,
        hit_count: u64,
        latency_cycles: u64,
        stall_cycles: u64,
        idle_cycles: u64,
    ) -> Self {
        InstructionRow {
            mnemonic: mnemonic.into(),
            hit_count,
            latency_cycles,
            stall_cycles,
            idle_cycles,
        }
    }
}

/// Pre-aggregated hardware counters keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThroughputCounters {
    values: BTreeMap<String, f64>,
}

impl ThroughputCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Get a specific counter value
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Executed floating-point operations: two per VALU FMA
    pub fn flops(&self) -> f64 {
        finite_or_zero(2.0 * self.get(COUNTER_VALU_INSTS).unwrap_or(0.0))
    }

    /// Bytes moved through L2 in both directions
    pub fn bytes_moved(&self) -> f64 {
        finite_or_zero(
            self.get(COUNTER_L2_READ_BYTES).unwrap_or(0.0)
                + self.get(COUNTER_L2_WRITE_BYTES).unwrap_or(0.0),
        )
    }
}

impl FromIterator<(String, f64)> for ThroughputCounters {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        ThroughputCounters {
            values: iter.into_iter().collect(),
        }
    }
}
