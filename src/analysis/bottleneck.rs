//! Bottleneck classifier
//!
//! A fixed, ordered rule list; the first rule whose predicate holds decides
//! the verdict. Rule order is part of the public behavior.

use std::fmt;

use serde::{Serialize, Serializer};

use super::instruction_mix::{InstructionClass, InstructionMixResult};
use super::roofline::RooflineBound;

pub const LATENCY_STALL_THRESHOLD: f64 = 0.30;
/// Cycles
pub const LATENCY_CYCLES_THRESHOLD: f64 = 200.0;
pub const VMEM_FRACTION_THRESHOLD: f64 = 0.20;
pub const COMPUTE_VALU_THRESHOLD: f64 = 0.60;
pub const COMPUTE_STALL_CEILING: f64 = 0.20;
pub const SCALAR_SALU_THRESHOLD: f64 = 0.25;
pub const BRANCH_FRACTION_THRESHOLD: f64 = 0.15;

/// Closed set of verdict labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BottleneckLabel {
    MemoryLatencyBound,
    MemoryBandwidthBound,
    ComputeBound,
    ScalarBottleneck,
    ControlFlowDivergence,
    MixedUnclear,
}

impl BottleneckLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckLabel::MemoryLatencyBound => "Memory Latency Bound",
            BottleneckLabel::MemoryBandwidthBound => "Memory Bandwidth Bound",
            BottleneckLabel::ComputeBound => "Compute Bound",
            BottleneckLabel::ScalarBottleneck => "Scalar Bottleneck",
            BottleneckLabel::ControlFlowDivergence => "Control Flow Divergence",
            BottleneckLabel::MixedUnclear => "Mixed / Unclear",
        }
    }
}

impl fmt::Display for BottleneckLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BottleneckLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleneckVerdict {
    pub primary: BottleneckLabel,
    /// Reserved; no rule sets it yet
    pub secondary: Option<BottleneckLabel>,
    pub confidence: f64,
    pub reasoning: Vec<String>,
}

/// Everything the rules look at
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BottleneckSignals {
    pub stall_fraction: f64,
    pub avg_memory_latency: f64,
    pub valu_fraction: f64,
    pub salu_fraction: f64,
    pub vmem_fraction: f64,
    pub branch_fraction: f64,
    pub roofline_bound: Option<RooflineBound>,
}

impl BottleneckSignals {
    pub fn from_mix(mix: &InstructionMixResult, roofline_bound: Option<RooflineBound>) -> Self {
        BottleneckSignals {
            stall_fraction: mix.stall_fraction,
            avg_memory_latency: mix.avg_memory_latency,
            valu_fraction: mix.fraction(InstructionClass::Valu),
            salu_fraction: mix.fraction(InstructionClass::Salu),
            vmem_fraction: mix.fraction(InstructionClass::Vmem),
            branch_fraction: mix.fraction(InstructionClass::Branch),
            roofline_bound,
        }
    }
}

struct Rule {
    label: BottleneckLabel,
    confidence: f64,
    reason: &'static str,
    applies: fn(&BottleneckSignals) -> bool,
}

const RULES: [Rule; 5] = [
    Rule {
        label: BottleneckLabel::MemoryLatencyBound,
        confidence: 0.8,
        reason: "High stall fraction with high memory latency.",
        applies: |s| {
            s.stall_fraction > LATENCY_STALL_THRESHOLD
                && s.avg_memory_latency > LATENCY_CYCLES_THRESHOLD
                && s.vmem_fraction < VMEM_FRACTION_THRESHOLD
        },
    },
    Rule {
        label: BottleneckLabel::MemoryBandwidthBound,
        confidence: 0.75,
        reason: "Roofline indicates memory-bound behavior.",
        applies: |s| {
            s.roofline_bound == Some(RooflineBound::Memory) && s.vmem_fraction > VMEM_FRACTION_THRESHOLD
        },
    },
    Rule {
        label: BottleneckLabel::ComputeBound,
        confidence: 0.75,
        reason: "High VALU fraction with low stall.",
        applies: |s| {
            s.roofline_bound == Some(RooflineBound::Compute)
                && s.valu_fraction > COMPUTE_VALU_THRESHOLD
                && s.stall_fraction < COMPUTE_STALL_CEILING
        },
    },
    Rule {
        label: BottleneckLabel::ScalarBottleneck,
        confidence: 0.7,
        reason: "High SALU instruction fraction.",
        applies: |s| s.salu_fraction > SCALAR_SALU_THRESHOLD,
    },
    Rule {
        label: BottleneckLabel::ControlFlowDivergence,
        confidence: 0.65,
        reason: "High branch fraction.",
        applies: |s| s.branch_fraction > BRANCH_FRACTION_THRESHOLD,
    },
];

pub fn classify(signals: &BottleneckSignals) -> BottleneckVerdict {
    let verdict = match RULES.iter().find(|rule| (rule.applies)(signals)) {
        Some(rule) => BottleneckVerdict {
            primary: rule.label,
            secondary: None,
            confidence: rule.confidence,
            reasoning: vec![rule.reason.to_string()],
        },
        None => BottleneckVerdict {
            primary: BottleneckLabel::MixedUnclear,
            secondary: None,
            confidence: 0.5,
            reasoning: vec!["No dominant bottleneck detected.".to_string()],
        },
    };

    tracing::debug!(
        primary = %verdict.primary,
        confidence = verdict.confidence,
        "classified bottleneck"
    );
    verdict
}
