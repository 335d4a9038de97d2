//! Roofline calculator
//!
//! Places a kernel under the compute or memory ceiling of its architecture.
//! Both ceilings are compared in GFLOP/s: the memory roof at the measured
//! arithmetic intensity is `peak_bandwidth_gbps * intensity`.

use std::fmt;

use serde::Serialize;

use crate::arch::ArchitectureProfile;
use crate::numeric::{finite_or_zero, safe_ratio};
use crate::trace::ThroughputCounters;

/// Which ceiling bounds the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RooflineBound {
    Compute,
    Memory,
}

impl fmt::Display for RooflineBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RooflineBound::Compute => write!(f, "compute"),
            RooflineBound::Memory => write!(f, "memory"),
        }
    }
}

/// Measured work of one kernel run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RooflineInput {
    pub flops: f64,
    pub bytes_moved: f64,
    pub runtime_s: f64,
}

impl RooflineInput {
    pub fn new(flops: f64, bytes_moved: f64, runtime_s: f64) -> Self {
        RooflineInput {
            flops,
            bytes_moved,
            runtime_s,
        }
    }

    /// Work from collector counters and a mean run time in milliseconds
    pub fn from_counters(counters: &ThroughputCounters, runtime_ms: f64) -> Self {
        RooflineInput::new(counters.flops(), counters.bytes_moved(), runtime_ms / 1000.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RooflineResult {
    pub flops: f64,
    pub bytes_moved: f64,
    /// FLOPs per byte
    pub arithmetic_intensity: f64,
    pub achieved_gflops: f64,
    /// GB/s
    pub achieved_bandwidth: f64,
    pub peak_bandwidth_gbps: f64,
    /// Absent when no clock is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_compute_gflops: Option<f64>,
    pub bound: RooflineBound,
}

/// Roofline model for one architecture
#[derive(Debug, Clone)]
pub struct RooflineCalculator<'a> {
    profile: &'a ArchitectureProfile,
    bandwidth_override_gbps: Option<f64>,
    clock_mhz: Option<f64>,
}

impl<'a> RooflineCalculator<'a> {
    /// Clock defaults to the one reported by the architecture metadata
    pub fn new(profile: &'a ArchitectureProfile) -> Self {
        RooflineCalculator {
            profile,
            bandwidth_override_gbps: None,
            clock_mhz: profile.max_clock_mhz,
        }
    }

    pub fn with_bandwidth_override(mut self, gbps: Option<f64>) -> Self {
        self.bandwidth_override_gbps = gbps;
        self
    }

    /// Prefer `clock_mhz` over the metadata clock when given
    pub fn with_clock_mhz(mut self, clock_mhz: Option<f64>) -> Self {
        self.clock_mhz = self.profile.effective_clock_mhz(clock_mhz);
        self
    }

    pub fn peak_bandwidth_gbps(&self) -> f64 {
        self.bandwidth_override_gbps
            .unwrap_or_else(|| self.profile.peak_bandwidth())
    }

    pub fn peak_compute_gflops(&self) -> Option<f64> {
        self.clock_mhz
            .map(|mhz| self.profile.peak_compute_gflops(mhz))
            .filter(|gflops| *gflops > 0.0)
    }

    pub fn calculate(&self, input: &RooflineInput) -> RooflineResult {
        let flops = finite_or_zero(input.flops);
        let bytes_moved = finite_or_zero(input.bytes_moved);
        let arithmetic_intensity = safe_ratio(flops, bytes_moved);
        let (achieved_gflops, achieved_bandwidth) = if input.runtime_s > 0.0 {
            (
                safe_ratio(flops, input.runtime_s) / 1e9,
                safe_ratio(bytes_moved, input.runtime_s) / 1e9,
            )
        } else {
            (0.0, 0.0)
        };

        let peak_bandwidth_gbps = self.peak_bandwidth_gbps();
        let peak_compute_gflops = self.peak_compute_gflops();

        // Without a compute ceiling or memory traffic there is no evidence of
        // a memory limit
        let bound = match peak_compute_gflops {
            Some(peak) if bytes_moved > 0.0 && peak_bandwidth_gbps * arithmetic_intensity < peak => {
                RooflineBound::Memory
            }
            _ => RooflineBound::Compute,
        };

        tracing::debug!(
            arithmetic_intensity,
            achieved_gflops,
            peak_bandwidth_gbps,
            bound = %bound,
            "computed roofline"
        );

        RooflineResult {
            flops,
            bytes_moved,
            arithmetic_intensity,
            achieved_gflops,
            achieved_bandwidth,
            peak_bandwidth_gbps,
            peak_compute_gflops,
            bound,
        }
    }
}
