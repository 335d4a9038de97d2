//! Optimization priority score

use serde::Serialize;

/// Lower bound on the non-reclaimable fraction
const MIN_REMAINING_FRACTION: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizationScore {
    /// Clamped to [0, 1]
    pub headroom_fraction: f64,
    /// Upper bound if all headroom were reclaimed
    pub estimated_speedup: f64,
    /// Headroom weighted by the dominant critical-path share
    pub priority_score: f64,
}

pub fn optimization_score(headroom_fraction: f64, critical_path_fraction: f64) -> OptimizationScore {
    let headroom = if headroom_fraction.is_nan() {
        0.0
    } else {
        headroom_fraction.clamp(0.0, 1.0)
    };
    OptimizationScore {
        headroom_fraction: headroom,
        estimated_speedup: 1.0 / (1.0 - headroom).max(MIN_REMAINING_FRACTION),
        priority_score: headroom * critical_path_fraction,
    }
}
