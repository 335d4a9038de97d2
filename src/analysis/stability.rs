//! Run-to-run timing stability

use std::fmt;

use serde::Serialize;

use crate::error::LensResult;
use crate::numeric::{finite_or_zero, safe_ratio};

/// Coefficient of variation at or below which runs are stable
pub const STABLE_CV: f64 = 0.05;
/// Coefficient of variation at or below which runs are moderately stable
pub const MODERATE_CV: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityClass {
    Stable,
    Moderate,
    Unstable,
}

impl StabilityClass {
    pub fn from_cv(cv: f64) -> Self {
        if cv <= STABLE_CV {
            StabilityClass::Stable
        } else if cv <= MODERATE_CV {
            StabilityClass::Moderate
        } else {
            StabilityClass::Unstable
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabilityClass::Stable => write!(f, "stable"),
            StabilityClass::Moderate => write!(f, "moderate"),
            StabilityClass::Unstable => write!(f, "unstable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStability {
    pub runs: usize,
    pub mean_ms: f64,
    /// Sample standard deviation
    pub std_ms: f64,
    pub cv: f64,
    pub stability: StabilityClass,
}

/// Summarize sequentially measured run times
///
/// Empty input is [`DataNotFound`](crate::LensError::DataNotFound).
pub fn summarize_runs(timings_ms: &[f64]) -> LensResult<RunStability> {
    if timings_ms.is_empty() {
        return Err(crate::data_not_found!("no run timings"));
    }

    let n = timings_ms.len() as f64;
    let mean_ms = finite_or_zero(timings_ms.iter().sum::<f64>() / n);
    let std_ms = if timings_ms.len() < 2 {
        0.0
    } else {
        let sum_sq: f64 = timings_ms.iter().map(|t| (t - mean_ms).powi(2)).sum();
        finite_or_zero((sum_sq / (n - 1.0)).sqrt())
    };
    let cv = safe_ratio(std_ms, mean_ms);

    Ok(RunStability {
        runs: timings_ms.len(),
        mean_ms,
        std_ms,
        cv,
        stability: StabilityClass::from_cv(cv),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_data_not_found() {
        assert!(summarize_runs(&[]).unwrap_err().is_data_not_found());
    }

    #[test]
    fn test_single_run() {
        let stats = summarize_runs(&[2.5]).unwrap();
        assert_eq!(stats.mean_ms, 2.5);
        assert_eq!(stats.std_ms, 0.0);
        assert_eq!(stats.stability, StabilityClass::Stable);
    }

    #[test]
    fn test_sample_stddev() {
        let stats = summarize_runs(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean_ms, 5.0);
        assert!((stats.std_ms - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.stability, StabilityClass::Unstable);
    }

    #[test]
    fn test_classification_bounds() {
        assert_eq!(StabilityClass::from_cv(0.05), StabilityClass::Stable);
        assert_eq!(StabilityClass::from_cv(0.07), StabilityClass::Moderate);
        assert_eq!(StabilityClass::from_cv(0.10), StabilityClass::Moderate);
        assert_eq!(StabilityClass::from_cv(0.11), StabilityClass::Unstable);
    }

    #[test]
    fn test_zero_mean_cv() {
        let stats = summarize_runs(&[0.0, 0.0]).unwrap();
        assert_eq!(stats.cv, 0.0);
    }
}
