//! Analysis engine: drives every stage from one [`TraceBundle`]

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analysis::{
    analyze_critical_path, require_critical_path, summarize_runs, CriticalPathResult,
    InstructionMixAnalyzer, InstructionMixResult, RooflineCalculator, RooflineInput,
};
use crate::arch::ArchitectureProfile;
use crate::config::AnalysisConfig;
use crate::error::LensResult;
use crate::metrics::{AnalysisMetrics, AnalysisTimer};
use crate::report::{GpuSection, OccupancySection, PerformanceReport, ReportAssembler};
use crate::trace::{InstructionRow, TraceBundle};

/// Instruction tables at least this long are ingested on the rayon pool
pub const PARALLEL_INGEST_MIN_ROWS: usize = 50_000;

/// One-call façade over the analysis stages
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    config: AnalysisConfig,
    metrics: Option<Arc<AnalysisMetrics>>,
}

impl PerformanceAnalyzer {
    /// Fails with a configuration error if `config` does not validate
    pub fn new(config: AnalysisConfig) -> LensResult<Self> {
        config.validate()?;
        Ok(PerformanceAnalyzer {
            config,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<AnalysisMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&Arc<AnalysisMetrics>> {
        self.metrics.as_ref()
    }

    /// Profile for the bundle's architecture, with the bandwidth override applied
    pub fn build_profile(&self, bundle: &TraceBundle) -> LensResult<ArchitectureProfile> {
        let profile = bundle.architecture.build()?;
        Ok(match self.config.bandwidth_override_gbps {
            Some(gbps) => profile.with_peak_bandwidth(gbps),
            None => profile,
        })
    }

    /// Run every stage and assemble the report
    ///
    /// Missing optional inputs drop their sections. Missing run timings, an
    /// unusable architecture or malformed dispatch rows fail the whole run.
    pub fn analyze(&self, bundle: &TraceBundle) -> LensResult<PerformanceReport> {
        if let Some(metrics) = &self.metrics {
            metrics.record_analysis_start();
        }
        let timer = AnalysisTimer::new(self.metrics.clone());

        let result = self.run_stages(bundle);
        match &result {
            Ok(report) => info!(
                arch = %report.gpu.architecture,
                sections = report.present_sections().len(),
                elapsed_ms = timer.elapsed_secs() * 1000.0,
                "analysis complete"
            ),
            Err(e) => {
                warn!(error = %e, category = %e.category(), "analysis failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_analysis_failed();
                }
            }
        }
        result
    }

    /// Critical path only, for callers whose primary input is the dispatch table
    pub fn critical_path(&self, bundle: &TraceBundle) -> LensResult<CriticalPathResult> {
        let result = require_critical_path(
            bundle.dispatches.as_deref(),
            &bundle.symbols,
            &self.config.dependency_gap,
        )?;
        self.record_dispatches(bundle);
        Ok(result)
    }

    fn run_stages(&self, bundle: &TraceBundle) -> LensResult<PerformanceReport> {
        let profile = self.build_profile(bundle)?;
        let clock_mhz = profile.effective_clock_mhz(self.config.clock_mhz);
        let runtime = summarize_runs(&bundle.timings_ms)?;
        debug!(
            arch = %profile.arch_id,
            family = %profile.family,
            runs = runtime.runs,
            mean_ms = runtime.mean_ms,
            "starting analysis"
        );

        let critical_path = match &bundle.dispatches {
            Some(rows) => {
                let result = analyze_critical_path(rows, &bundle.symbols, &self.config.dependency_gap)?;
                self.record_dispatches(bundle);
                Some(result)
            }
            None => None,
        };

        let instruction_mix = bundle
            .instructions
            .as_deref()
            .map(|rows| self.instruction_mix(rows));

        let roofline = bundle.counters.as_ref().map(|counters| {
            RooflineCalculator::new(&profile)
                .with_clock_mhz(clock_mhz)
                .calculate(&RooflineInput::from_counters(counters, runtime.mean_ms))
        });

        let occupancy =
            OccupancySection::from_inputs(&profile, bundle.kernel.as_ref(), bundle.resources.as_ref());

        Ok(ReportAssembler::new(GpuSection::new(&profile, clock_mhz), runtime)
            .with_headroom_derating(self.config.headroom_derating)
            .with_kernel(bundle.kernel.clone())
            .with_resources(bundle.resources)
            .with_occupancy(occupancy)
            .with_roofline(roofline)
            .with_critical_path(critical_path)
            .with_instruction_mix(instruction_mix)
            .assemble())
    }

    fn instruction_mix(&self, rows: &[InstructionRow]) -> InstructionMixResult {
        if let Some(metrics) = &self.metrics {
            metrics.record_instruction_rows(rows.len());
        }
        let analyzer = InstructionMixAnalyzer::new();
        if rows.len() >= PARALLEL_INGEST_MIN_ROWS {
            analyzer.analyze_parallel(rows)
        } else {
            analyzer.analyze(rows)
        }
    }

    fn record_dispatches(&self, bundle: &TraceBundle) {
        if let (Some(metrics), Some(rows)) = (&self.metrics, &bundle.dispatches) {
            metrics.record_dispatches(rows.len());
        }
    }
}
