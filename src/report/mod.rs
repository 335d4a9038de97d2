//! Performance report and its assembler
//!
//! The report is built once and never mutated. Every optional section is
//! either computed from real input or omitted; nothing is filled with
//! placeholder values.

use serde::Serialize;

use crate::analysis::{
    classify, optimization_score, BottleneckSignals, BottleneckVerdict, CriticalPathResult,
    InstructionMixResult, OptimizationScore, RooflineResult, RunStability,
};
use crate::arch::{ArchFamily, ArchitectureProfile, OccupancyLimiter};
use crate::config::DEFAULT_HEADROOM_DERATING;
use crate::error::LensResult;
use crate::numeric::finite_or_zero;
use crate::trace::{KernelLaunch, KernelResources};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuSection {
    pub architecture: String,
    pub family: ArchFamily,
    pub wave_size: u32,
    pub compute_units: u32,
    /// FLOP/s, only when a clock is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theoretical_peak_flops: Option<f64>,
    pub peak_bandwidth_gbps: f64,
}

impl GpuSection {
    pub fn new(profile: &ArchitectureProfile, clock_mhz: Option<f64>) -> Self {
        GpuSection {
            architecture: profile.arch_id.clone(),
            family: profile.family,
            wave_size: profile.wave_size,
            compute_units: profile.compute_units,
            theoretical_peak_flops: clock_mhz
                .map(|mhz| profile.peak_compute_flops(mhz))
                .filter(|flops| *flops > 0.0),
            peak_bandwidth_gbps: profile.peak_bandwidth(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupancySection {
    pub theoretical: f64,
    pub active_waves_per_simd: u32,
    pub threads_per_block: u32,
    pub wave_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limiter: Option<OccupancyLimiter>,
}

impl OccupancySection {
    /// Needs the block shape and the register count; LDS defaults to zero
    pub fn from_inputs(
        profile: &ArchitectureProfile,
        kernel: Option<&KernelLaunch>,
        resources: Option<&KernelResources>,
    ) -> Option<Self> {
        let threads_per_block = kernel?.threads_per_block()?;
        let resources = resources?;
        let vgpr = resources.vgpr_per_thread?;
        let lds = resources.lds_bytes.unwrap_or(0);

        let estimate = profile.occupancy_estimate(vgpr, lds, threads_per_block);
        Some(OccupancySection {
            theoretical: estimate.theoretical,
            active_waves_per_simd: estimate.active_waves_per_simd,
            threads_per_block,
            wave_size: profile.wave_size,
            limiter: estimate.limiter,
        })
    }
}

/// Summary of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub schema_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<KernelLaunch>,
    pub gpu: GpuSection,
    pub runtime: RunStability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<KernelResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<OccupancySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roofline: Option<RooflineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_path: Option<CriticalPathResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_mix: Option<InstructionMixResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottleneck: Option<BottleneckVerdict>,
    /// Stall fraction scaled by the headroom derating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headroom_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationScore>,
}

impl PerformanceReport {
    pub fn to_json(&self) -> LensResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_value(&self) -> LensResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Names of the optional sections that are present
    pub fn present_sections(&self) -> Vec<&'static str> {
        let mut sections = Vec::new();
        if self.kernel.is_some() {
            sections.push("kernel");
        }
        if self.resources.is_some() {
            sections.push("resources");
        }
        if self.occupancy.is_some() {
            sections.push("occupancy");
        }
        if self.roofline.is_some() {
            sections.push("roofline");
        }
        if self.critical_path.is_some() {
            sections.push("critical_path");
        }
        if self.instruction_mix.is_some() {
            sections.push("instruction_mix");
        }
        if self.bottleneck.is_some() {
            sections.push("bottleneck");
        }
        if self.headroom_fraction.is_some() {
            sections.push("headroom_fraction");
        }
        if self.optimization.is_some() {
            sections.push("optimization");
        }
        sections
    }
}

/// Composes stage outputs into a [`PerformanceReport`]
///
/// Each optional input is independent: leaving one out removes its section
/// and whatever is derived from it, nothing else.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    gpu: GpuSection,
    runtime: RunStability,
    kernel: Option<KernelLaunch>,
    resources: Option<KernelResources>,
    occupancy: Option<OccupancySection>,
    roofline: Option<RooflineResult>,
    critical_path: Option<CriticalPathResult>,
    instruction_mix: Option<InstructionMixResult>,
    headroom_derating: f64,
}

impl ReportAssembler {
    pub fn new(gpu: GpuSection, runtime: RunStability) -> Self {
        ReportAssembler {
            gpu,
            runtime,
            kernel: None,
            resources: None,
            occupancy: None,
            roofline: None,
            critical_path: None,
            instruction_mix: None,
            headroom_derating: DEFAULT_HEADROOM_DERATING,
        }
    }

    pub fn with_headroom_derating(mut self, derating: f64) -> Self {
        self.headroom_derating = derating;
        self
    }

    pub fn with_kernel(mut self, kernel: Option<KernelLaunch>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_resources(mut self, resources: Option<KernelResources>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_occupancy(mut self, occupancy: Option<OccupancySection>) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_roofline(mut self, roofline: Option<RooflineResult>) -> Self {
        self.roofline = roofline;
        self
    }

    pub fn with_critical_path(mut self, critical_path: Option<CriticalPathResult>) -> Self {
        self.critical_path = critical_path;
        self
    }

    pub fn with_instruction_mix(mut self, instruction_mix: Option<InstructionMixResult>) -> Self {
        self.instruction_mix = instruction_mix;
        self
    }

    pub fn assemble(self) -> PerformanceReport {
        let roofline_bound = self.roofline.as_ref().map(|r| r.bound);

        let bottleneck: Option<BottleneckVerdict> = self
            .instruction_mix
            .as_ref()
            .map(|mix| classify(&BottleneckSignals::from_mix(mix, roofline_bound)));

        let headroom_fraction = self
            .instruction_mix
            .as_ref()
            .map(|mix| finite_or_zero(mix.stall_fraction * self.headroom_derating));

        let optimization = match (headroom_fraction, self.critical_path.as_ref()) {
            (Some(headroom), Some(path)) => {
                Some(optimization_score(headroom, path.dominant_symbol_fraction))
            }
            _ => None,
        };

        let report = PerformanceReport {
            schema_version: REPORT_SCHEMA_VERSION,
            kernel: self.kernel,
            gpu: self.gpu,
            runtime: self.runtime,
            resources: self.resources,
            occupancy: self.occupancy,
            roofline: self.roofline,
            critical_path: self.critical_path,
            instruction_mix: self.instruction_mix,
            bottleneck,
            headroom_fraction,
            optimization,
        };

        tracing::debug!(sections = ?report.present_sections(), "assembled report");
        report
    }
}
