//! Prometheus-compatible metrics for analysis runs
//!
//! Only the [`crate::engine`] façade records metrics; analysis stages stay
//! pure. Export renders the Prometheus text format.

use std::sync::Arc;
use std::time::Instant;

use prometheus_client::{
    encoding::text::encode,
    metrics::counter::Counter,
    metrics::histogram::{exponential_buckets, Histogram},
    registry::Registry,
};

use crate::error::LensResult;

/// Counters and timings for one analyzer instance
#[derive(Debug)]
pub struct AnalysisMetrics {
    registry: Registry,

    /// Analyses started
    pub analyses: Counter<u64>,

    /// Analyses that returned an error
    pub analyses_failed: Counter<u64>,

    /// Dispatch rows fed into the critical path solver
    pub dispatches_analyzed: Counter<u64>,

    /// Instruction rows fed into the mix analyzer
    pub instruction_rows_analyzed: Counter<u64>,

    /// Wall time of one full analysis
    pub analysis_duration_seconds: Histogram,
}

impl AnalysisMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counter names gain the `_total` suffix on export
        let analyses = Counter::default();
        registry.register(
            "rocmlens_analyses",
            "Total number of analyses started",
            analyses.clone(),
        );

        let analyses_failed = Counter::default();
        registry.register(
            "rocmlens_analyses_failed",
            "Total number of analyses that returned an error",
            analyses_failed.clone(),
        );

        let dispatches_analyzed = Counter::default();
        registry.register(
            "rocmlens_dispatches_analyzed",
            "Total number of dispatch rows analyzed",
            dispatches_analyzed.clone(),
        );

        let instruction_rows_analyzed = Counter::default();
        registry.register(
            "rocmlens_instruction_rows_analyzed",
            "Total number of instruction-site rows analyzed",
            instruction_rows_analyzed.clone(),
        );

        // Buckets: 0.1ms .. 10s
        let analysis_duration_seconds = Histogram::new(exponential_buckets(0.0001, 10.0, 6));
        registry.register(
            "rocmlens_analysis_duration_seconds",
            "Wall time of one analysis in seconds",
            analysis_duration_seconds.clone(),
        );

        AnalysisMetrics {
            registry,
            analyses,
            analyses_failed,
            dispatches_analyzed,
            instruction_rows_analyzed,
            analysis_duration_seconds,
        }
    }

    pub fn record_analysis_start(&self) {
        self.analyses.inc();
    }

    pub fn record_analysis_failed(&self) {
        self.analyses_failed.inc();
    }

    pub fn record_dispatches(&self, count: usize) {
        self.dispatches_analyzed.inc_by(count as u64);
    }

    pub fn record_instruction_rows(&self, count: usize) {
        self.instruction_rows_analyzed.inc_by(count as u64);
    }

    pub fn record_duration(&self, duration_sec: f64) {
        self.analysis_duration_seconds.observe(duration_sec);
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> LensResult<String> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)
            .map_err(|e| crate::internal_error!("metrics encoding failed: {}", e))?;
        Ok(buffer)
    }
}

impl Default for AnalysisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Records the analysis duration when dropped
pub struct AnalysisTimer {
    metrics: Option<Arc<AnalysisMetrics>>,
    start: Instant,
}

impl AnalysisTimer {
    pub fn new(metrics: Option<Arc<AnalysisMetrics>>) -> Self {
        AnalysisTimer {
            metrics,
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for AnalysisTimer {
    fn drop(&mut self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_duration(self.start.elapsed().as_secs_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let export = AnalysisMetrics::new().export().unwrap();
        assert!(export.contains("rocmlens_analyses_total"));
        assert!(export.contains("rocmlens_analysis_duration_seconds"));
    }

    #[test]
    fn test_counters() {
        let metrics = AnalysisMetrics::new();
        metrics.record_analysis_start();
        metrics.record_analysis_start();
        metrics.record_analysis_failed();
        metrics.record_dispatches(12);
        metrics.record_instruction_rows(40);

        let export = metrics.export().unwrap();
        assert!(export.contains("rocmlens_analyses_total 2"));
        assert!(export.contains("rocmlens_analyses_failed_total 1"));
        assert!(export.contains("rocmlens_dispatches_analyzed_total 12"));
        assert!(export.contains("rocmlens_instruction_rows_analyzed_total 40"));
    }

    #[test]
    fn test_timer_records_on_drop() {
        let metrics = Arc::new(AnalysisMetrics::new());
        {
            let _timer = AnalysisTimer::new(Some(Arc::clone(&metrics)));
        }
        let export = metrics.export().unwrap();
        assert!(export.contains("rocmlens_analysis_duration_seconds_count 1"));
    }

    #[test]
    fn test_timer_without_metrics() {
        let timer = AnalysisTimer::new(None);
        assert!(timer.elapsed_secs() >= 0.0);
    }
}
