//! Analysis configuration
//!
//! Tunables that change analysis semantics live here so that every run can
//! state exactly which policy produced its report.
//!
//! Environment variables (read by [`AnalysisConfig::from_env`]):
//! - `ROCMLENS_GAP_POLICY`: `scale-aware` (default) or `fixed`
//! - `ROCMLENS_GAP_FIXED_NS`: cutoff for the fixed policy in nanoseconds
//! - `ROCMLENS_BANDWIDTH_GBPS`: measured peak memory bandwidth override
//! - `ROCMLENS_CLOCK_MHZ`: clock used for the peak compute ceiling

use std::env;

use serde::Serialize;

use crate::error::{LensError, LensResult};

/// Lower bound of the scale-aware cross-queue gap threshold (50 µs)
pub const DEFAULT_GAP_FLOOR_NS: u64 = 50_000;

/// Fraction of the total observed span allowed as a dependency gap
pub const DEFAULT_GAP_SPAN_FRACTION: f64 = 0.01;

/// Fixed 5 µs cutoff used by earlier trace tooling
pub const LEGACY_FIXED_GAP_NS: u64 = 5_000;

/// Share of stall cycles assumed reclaimable when estimating headroom
pub const DEFAULT_HEADROOM_DERATING: f64 = 0.8;

/// How the graph builder decides whether a cross-queue gap implies a dependency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum DependencyGapPolicy {
    /// `max(floor_ns, span_fraction × total span)`
    ScaleAware { floor_ns: u64, span_fraction: f64 },
    /// Constant cutoff independent of the trace length
    Fixed { threshold_ns: u64 },
}

impl Default for DependencyGapPolicy {
    fn default() -> Self {
        DependencyGapPolicy::ScaleAware {
            floor_ns: DEFAULT_GAP_FLOOR_NS,
            span_fraction: DEFAULT_GAP_SPAN_FRACTION,
        }
    }
}

impl DependencyGapPolicy {
    /// The legacy fixed 5 µs policy
    pub fn legacy_fixed() -> Self {
        DependencyGapPolicy::Fixed {
            threshold_ns: LEGACY_FIXED_GAP_NS,
        }
    }

    /// Resolve the threshold for a trace spanning `total_span_ns`
    pub fn threshold_ns(&self, total_span_ns: u64) -> u64 {
        match *self {
            DependencyGapPolicy::ScaleAware {
                floor_ns,
                span_fraction,
            } => {
                let scaled = (span_fraction * total_span_ns as f64) as u64;
                floor_ns.max(scaled)
            }
            DependencyGapPolicy::Fixed { threshold_ns } => threshold_ns,
        }
    }

    /// Parse a policy name as accepted by the CLI and environment
    pub fn from_name(name: &str, fixed_ns: Option<u64>) -> LensResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "scale-aware" | "scale_aware" | "scaled" => Ok(DependencyGapPolicy::default()),
            "fixed" | "legacy" => Ok(DependencyGapPolicy::Fixed {
                threshold_ns: fixed_ns.unwrap_or(LEGACY_FIXED_GAP_NS),
            }),
            other => Err(LensError::InvalidConfiguration(format!(
                "unknown dependency gap policy '{}' (expected 'scale-aware' or 'fixed')",
                other
            ))),
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Cross-queue dependency inference policy
    pub dependency_gap: DependencyGapPolicy,
    /// Measured peak bandwidth replacing the architecture default (GB/s)
    pub bandwidth_override_gbps: Option<f64>,
    /// Clock for the peak compute ceiling; falls back to architecture metadata
    pub clock_mhz: Option<f64>,
    /// Multiplier applied to the stall fraction to estimate headroom
    pub headroom_derating: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            dependency_gap: DependencyGapPolicy::default(),
            bandwidth_override_gbps: None,
            clock_mhz: None,
            headroom_derating: DEFAULT_HEADROOM_DERATING,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependency_gap(mut self, policy: DependencyGapPolicy) -> Self {
        self.dependency_gap = policy;
        self
    }

    /// Set the cutoff of an already selected fixed gap policy
    ///
    /// The scale-aware policy has no fixed cutoff, so this is rejected rather
    /// than silently ignored.
    pub fn with_fixed_gap_ns(mut self, threshold_ns: u64) -> LensResult<Self> {
        match self.dependency_gap {
            DependencyGapPolicy::Fixed { .. } => {
                self.dependency_gap = DependencyGapPolicy::Fixed { threshold_ns };
                Ok(self)
            }
            DependencyGapPolicy::ScaleAware { .. } => Err(LensError::InvalidConfiguration(
                "a fixed gap cutoff requires the fixed dependency gap policy".to_string(),
            )),
        }
    }

    pub fn with_bandwidth_override(mut self, gbps: f64) -> Self {
        self.bandwidth_override_gbps = Some(gbps);
        self
    }

    pub fn with_clock_mhz(mut self, clock_mhz: f64) -> Self {
        self.clock_mhz = Some(clock_mhz);
        self
    }

    pub fn with_headroom_derating(mut self, derating: f64) -> Self {
        self.headroom_derating = derating;
        self
    }

    /// Apply `ROCMLENS_*` environment overrides on top of the defaults
    ///
    /// Malformed numeric values are rejected rather than ignored.
    pub fn from_env() -> LensResult<Self> {
        let mut config = AnalysisConfig::default();

        let fixed_ns = match env::var("ROCMLENS_GAP_FIXED_NS") {
            Ok(raw) => Some(parse_env_number::<u64>("ROCMLENS_GAP_FIXED_NS", &raw)?),
            Err(_) => None,
        };

        if let Ok(policy) = env::var("ROCMLENS_GAP_POLICY") {
            config.dependency_gap = DependencyGapPolicy::from_name(&policy, fixed_ns)?;
        }

        if let Ok(raw) = env::var("ROCMLENS_BANDWIDTH_GBPS") {
            config.bandwidth_override_gbps =
                Some(parse_env_number::<f64>("ROCMLENS_BANDWIDTH_GBPS", &raw)?);
        }

        if let Ok(raw) = env::var("ROCMLENS_CLOCK_MHZ") {
            config.clock_mhz = Some(parse_env_number::<f64>("ROCMLENS_CLOCK_MHZ", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> LensResult<()> {
        if let DependencyGapPolicy::ScaleAware { span_fraction, .. } = self.dependency_gap {
            if !span_fraction.is_finite() || !(0.0..=1.0).contains(&span_fraction) {
                return Err(LensError::InvalidConfiguration(format!(
                    "span_fraction must be within [0, 1], got {}",
                    span_fraction
                )));
            }
        }

        if let Some(gbps) = self.bandwidth_override_gbps {
            if !gbps.is_finite() || gbps <= 0.0 {
                return Err(LensError::InvalidConfiguration(format!(
                    "bandwidth override must be positive, got {}",
                    gbps
                )));
            }
        }

        if let Some(clock) = self.clock_mhz {
            if !clock.is_finite() || clock <= 0.0 {
                return Err(LensError::InvalidConfiguration(format!(
                    "clock must be positive, got {} MHz",
                    clock
                )));
            }
        }

        if !self.headroom_derating.is_finite() || !(0.0..=1.0).contains(&self.headroom_derating) {
            return Err(LensError::InvalidConfiguration(format!(
                "headroom derating must be within [0, 1], got {}",
                self.headroom_derating
            )));
        }

        Ok(())
    }
}

fn parse_env_number<T: std::str::FromStr>(name: &str, raw: &str) -> LensResult<T> {
    raw.trim().parse::<T>().map_err(|_| {
        LensError::InvalidConfiguration(format!("{} is not a valid number: '{}'", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_scale_aware_threshold_uses_floor_for_short_runs() {
        let policy = DependencyGapPolicy::default();
        assert_eq!(policy.threshold_ns(0), 50_000);
        assert_eq!(policy.threshold_ns(1_000_000), 50_000);
    }

    #[test]
    fn test_scale_aware_threshold_scales_with_long_runs() {
        let policy = DependencyGapPolicy::default();
        // 1% of 100 ms = 1 ms
        assert_eq!(policy.threshold_ns(100_000_000), 1_000_000);
    }

    #[test]
    fn test_fixed_threshold_ignores_span() {
        let policy = DependencyGapPolicy::legacy_fixed();
        assert_eq!(policy.threshold_ns(0), 5_000);
        assert_eq!(policy.threshold_ns(10_000_000_000), 5_000);
    }

    #[test]
    fn test_policy_from_name() {
        assert_eq!(
            DependencyGapPolicy::from_name("scale-aware", None).unwrap(),
            DependencyGapPolicy::default()
        );
        assert_eq!(
            DependencyGapPolicy::from_name("fixed", Some(12_000)).unwrap(),
            DependencyGapPolicy::Fixed {
                threshold_ns: 12_000
            }
        );
        assert_eq!(
            DependencyGapPolicy::from_name("FIXED", None).unwrap(),
            DependencyGapPolicy::legacy_fixed()
        );
        assert!(DependencyGapPolicy::from_name("adaptive", None).is_err());
    }

    #[test]
    fn test_fixed_gap_cutoff_needs_fixed_policy() {
        let config = AnalysisConfig::new()
            .with_dependency_gap(DependencyGapPolicy::legacy_fixed())
            .with_fixed_gap_ns(9_000)
            .unwrap();
        assert_eq!(
            config.dependency_gap,
            DependencyGapPolicy::Fixed { threshold_ns: 9_000 }
        );

        let err = AnalysisConfig::new().with_fixed_gap_ns(9_000).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    #[serial]
    fn test_fixed_gap_cutoff_applies_to_env_selected_policy() {
        env::set_var("ROCMLENS_GAP_POLICY", "fixed");
        let config = AnalysisConfig::from_env().and_then(|c| c.with_fixed_gap_ns(12_500));
        env::remove_var("ROCMLENS_GAP_POLICY");

        assert_eq!(
            config.unwrap().dependency_gap,
            DependencyGapPolicy::Fixed { threshold_ns: 12_500 }
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.headroom_derating, 0.8);
        assert!(config.bandwidth_override_gbps.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AnalysisConfig::new()
            .with_bandwidth_override(0.0)
            .validate()
            .is_err());
        assert!(AnalysisConfig::new()
            .with_clock_mhz(-1.0)
            .validate()
            .is_err());
        assert!(AnalysisConfig::new()
            .with_headroom_derating(1.5)
            .validate()
            .is_err());
        assert!(AnalysisConfig::new()
            .with_dependency_gap(DependencyGapPolicy::ScaleAware {
                floor_ns: 1,
                span_fraction: f64::NAN,
            })
            .validate()
            .is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::set_var("ROCMLENS_GAP_POLICY", "fixed");
        env::set_var("ROCMLENS_GAP_FIXED_NS", "7000");
        env::set_var("ROCMLENS_BANDWIDTH_GBPS", "512.5");
        env::remove_var("ROCMLENS_CLOCK_MHZ");

        let config = AnalysisConfig::from_env().unwrap();

        env::remove_var("ROCMLENS_GAP_POLICY");
        env::remove_var("ROCMLENS_GAP_FIXED_NS");
        env::remove_var("ROCMLENS_BANDWIDTH_GBPS");

        assert_eq!(
            config.dependency_gap,
            DependencyGapPolicy::Fixed { threshold_ns: 7000 }
        );
        assert_eq!(config.bandwidth_override_gbps, Some(512.5));
        assert_eq!(config.clock_mhz, None);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_malformed_number() {
        env::set_var("ROCMLENS_CLOCK_MHZ", "fast");
        let result = AnalysisConfig::from_env();
        env::remove_var("ROCMLENS_CLOCK_MHZ");

        assert!(matches!(result, Err(LensError::InvalidConfiguration(_))));
    }
}
