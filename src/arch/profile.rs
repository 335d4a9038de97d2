//! Architecture capability profile
//!
//! [`ArchitectureProfile`] is built once per analysis run and never mutated.
//! It answers two questions: how many waves a kernel can keep resident
//! (occupancy) and what the compute and memory ceilings are (roofline).

use std::fmt;

use serde::Serialize;

use super::family::ArchFamily;
use super::metadata::AgentMetadata;
use crate::error::{LensError, LensResult};
use crate::numeric::safe_ratio;

/// Immutable description of one GPU's capability limits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitectureProfile {
    /// GFX identifier as supplied (e.g. "gfx90a")
    pub arch_id: String,
    pub family: ArchFamily,
    pub wave_size: u32,
    pub compute_units: u32,
    pub simd_per_cu: u32,
    pub max_waves_per_simd: u32,
    /// Vector register file per SIMD (32-bit registers)
    pub vgpr_per_simd: u32,
    /// Scalar register file per SIMD (32-bit registers)
    pub sgpr_per_simd: u32,
    pub lds_per_cu_bytes: u32,
    pub supports_mfma: bool,
    /// Known only for metadata-built profiles
    pub max_clock_mhz: Option<f64>,
    /// Family default unless overridden with a measured value
    pub peak_bandwidth_gbps: f64,
}

/// Resource that bounds the resident wave count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyLimiter {
    /// Vector register file
    Registers,
    /// Hardware wave slots (no resource pressure)
    HardwareWaves,
    /// Local data share
    LocalDataShare,
}

impl fmt::Display for OccupancyLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyLimiter::HardwareWaves => write!(f, "hardware wave slots"),
            OccupancyLimiter::Registers => write!(f, "vector registers"),
            OccupancyLimiter::LocalDataShare => write!(f, "local data share"),
        }
    }
}

/// Result of an occupancy computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupancyEstimate {
    /// Achievable fraction of hardware wave slots, in [0, 1]
    pub theoretical: f64,
    /// Resident waves per SIMD
    pub active_waves_per_simd: u32,
    /// `None` when the kernel declares no vector registers
    pub limiter: Option<OccupancyLimiter>,
}

impl ArchitectureProfile {
    /// Build from the fixed per-family registry
    ///
    /// Fails with [`LensError::UnknownArchitecture`] for identifiers outside
    /// the supported families.
    pub fn from_registry(gfx_id: &str, compute_units: u32) -> LensResult<Self> {
        let family = ArchFamily::from_gfx_id(gfx_id)
            .ok_or_else(|| LensError::UnknownArchitecture(gfx_id.to_string()))?;

        if compute_units == 0 {
            return Err(LensError::InvalidConfiguration(
                "compute_units must be non-zero".to_string(),
            ));
        }

        let table = family.table();
        Ok(ArchitectureProfile {
            arch_id: gfx_id.trim().to_lowercase(),
            family,
            wave_size: table.wave_size,
            compute_units,
            simd_per_cu: table.simd_per_cu,
            max_waves_per_simd: table.max_waves_per_simd,
            vgpr_per_simd: table.vgpr_per_simd,
            sgpr_per_simd: table.sgpr_per_simd,
            lds_per_cu_bytes: table.lds_per_cu_bytes,
            supports_mfma: table.supports_mfma,
            max_clock_mhz: None,
            peak_bandwidth_gbps: table.default_peak_bandwidth_gbps,
        })
    }

    /// Build from a dynamic agent metadata record
    ///
    /// Every required field must be present; nothing is defaulted. Waves per
    /// SIMD are derived as `max_waves_per_cu / simd_per_cu`.
    pub fn from_metadata(meta: &AgentMetadata) -> LensResult<Self> {
        let validated = meta.validate()?;

        let family = ArchFamily::from_gfx_id(&validated.arch_name)
            .ok_or_else(|| LensError::UnknownArchitecture(validated.arch_name.clone()))?;
        let table = family.table();

        Ok(ArchitectureProfile {
            arch_id: validated.arch_name.to_lowercase(),
            family,
            wave_size: validated.wavefront_size,
            compute_units: validated.compute_unit_count,
            simd_per_cu: validated.simd_per_cu,
            max_waves_per_simd: validated.max_waves_per_cu / validated.simd_per_cu,
            vgpr_per_simd: table.vgpr_per_simd,
            sgpr_per_simd: table.sgpr_per_simd,
            lds_per_cu_bytes: table.lds_per_cu_bytes,
            supports_mfma: table.supports_mfma,
            max_clock_mhz: Some(validated.max_clock_mhz),
            peak_bandwidth_gbps: table.default_peak_bandwidth_gbps,
        })
    }

    /// Replace the family default bandwidth with a measured value
    pub fn with_peak_bandwidth(mut self, gbps: f64) -> Self {
        self.peak_bandwidth_gbps = gbps;
        self
    }

    /// Maximum resident waves per compute unit
    pub fn max_waves_per_cu(&self) -> u32 {
        self.max_waves_per_simd * self.simd_per_cu
    }

    /// Theoretical occupancy fraction in [0, 1]
    pub fn compute_occupancy(
        &self,
        vgpr_per_thread: u32,
        lds_bytes_per_block: u32,
        threads_per_block: u32,
    ) -> f64 {
        self.occupancy_estimate(vgpr_per_thread, lds_bytes_per_block, threads_per_block)
            .theoretical
    }

    /// Occupancy with the binding resource identified
    ///
    /// A kernel declaring zero vector registers yields `0.0` (closed failure,
    /// not an error).
    pub fn occupancy_estimate(
        &self,
        vgpr_per_thread: u32,
        lds_bytes_per_block: u32,
        threads_per_block: u32,
    ) -> OccupancyEstimate {
        let wave_size = u64::from(self.wave_size);
        let waves_per_block = if wave_size == 0 {
            0
        } else {
            u64::from(threads_per_block).div_ceil(wave_size)
        };

        let vgpr_per_wave = u64::from(vgpr_per_thread) * wave_size;
        let by_hw = u64::from(self.max_waves_per_simd);
        if vgpr_per_wave == 0 || by_hw == 0 {
            return OccupancyEstimate {
                theoretical: 0.0,
                active_waves_per_simd: 0,
                limiter: None,
            };
        }

        let by_regs = u64::from(self.vgpr_per_simd) / vgpr_per_wave;

        let by_lds = if lds_bytes_per_block > 0 {
            let blocks_per_cu = u64::from(self.lds_per_cu_bytes) / u64::from(lds_bytes_per_block);
            let waves_per_cu = blocks_per_cu * waves_per_block;
            waves_per_cu / u64::from(self.simd_per_cu.max(1))
        } else {
            by_hw
        };

        let active = by_regs.min(by_hw).min(by_lds);
        // Ties go to the first binding resource in declaration order
        let limiter = if active == by_regs {
            OccupancyLimiter::Registers
        } else if active == by_hw {
            OccupancyLimiter::HardwareWaves
        } else {
            OccupancyLimiter::LocalDataShare
        };

        OccupancyEstimate {
            theoretical: safe_ratio(active as f64, by_hw as f64).clamp(0.0, 1.0),
            active_waves_per_simd: active as u32,
            limiter: Some(limiter),
        }
    }

    /// Peak FP32 throughput in FLOP/s at `clock_mhz`
    ///
    /// One FMA per lane per cycle counts as two FLOPs. The lane count comes
    /// from the family table, which differs from the wave size on RDNA parts
    /// running wave64.
    pub fn peak_compute_flops(&self, clock_mhz: f64) -> f64 {
        let lanes = u64::from(self.family.table().alu_lanes_per_simd);
        let total_simd = u64::from(self.compute_units) * u64::from(self.simd_per_cu);
        let flops_per_cycle = (total_simd * lanes * 2) as f64;
        let clock_hz = clock_mhz * 1e6;
        if !clock_hz.is_finite() || clock_hz <= 0.0 {
            return 0.0;
        }
        flops_per_cycle * clock_hz
    }

    /// Peak FP32 throughput in GFLOP/s
    pub fn peak_compute_gflops(&self, clock_mhz: f64) -> f64 {
        self.peak_compute_flops(clock_mhz) / 1e9
    }

    /// Peak memory bandwidth in GB/s
    pub fn peak_bandwidth(&self) -> f64 {
        self.peak_bandwidth_gbps
    }

    /// Caller override first, then the clock reported by metadata
    pub fn effective_clock_mhz(&self, override_mhz: Option<f64>) -> Option<f64> {
        override_mhz.or(self.max_clock_mhz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdna2() -> ArchitectureProfile {
        ArchitectureProfile::from_registry("gfx90a", 104).unwrap()
    }

    fn cdna3_meta() -> AgentMetadata {
        AgentMetadata {
            arch_name: Some("gfx942".to_string()),
            compute_unit_count: Some(304),
            simd_per_cu: Some(4),
            max_waves_per_cu: Some(32),
            wavefront_size: Some(64),
            max_clock_mhz: Some(2100.0),
        }
    }

    #[test]
    fn test_registry_unknown_architecture() {
        let err = ArchitectureProfile::from_registry("gfx1200", 32).unwrap_err();
        assert!(err.is_configuration_error());
        assert_eq!(err.to_string(), "Unsupported architecture 'gfx1200'");
    }

    #[test]
    fn test_registry_cdna2_constants() {
        let arch = cdna2();
        assert_eq!(arch.family, ArchFamily::Cdna2);
        assert_eq!(arch.wave_size, 64);
        assert_eq!(arch.max_waves_per_simd, 10);
        assert_eq!(arch.max_waves_per_cu(), 40);
        assert!(arch.supports_mfma);
        assert!(arch.max_clock_mhz.is_none());
    }

    #[test]
    fn test_metadata_derives_waves_per_simd() {
        let arch = ArchitectureProfile::from_metadata(&cdna3_meta()).unwrap();
        assert_eq!(arch.family, ArchFamily::Cdna3);
        assert_eq!(arch.max_waves_per_simd, 8);
        assert_eq!(arch.max_clock_mhz, Some(2100.0));
    }

    #[test]
    fn test_metadata_unknown_family() {
        let mut meta = cdna3_meta();
        meta.arch_name = Some("gfx1100".to_string());
        assert!(matches!(
            ArchitectureProfile::from_metadata(&meta),
            Err(LensError::UnknownArchitecture(_))
        ));
    }

    #[test]
    fn test_occupancy_full_when_unconstrained() {
        // 32 VGPRs × 64 lanes = 2048 per wave; 65536 / 2048 = 32 > 10 hw slots
        let est = cdna2().occupancy_estimate(32, 0, 256);
        assert_eq!(est.theoretical, 1.0);
        assert_eq!(est.active_waves_per_simd, 10);
        assert_eq!(est.limiter, Some(OccupancyLimiter::HardwareWaves));
    }

    #[test]
    fn test_occupancy_register_limited() {
        // 256 VGPRs × 64 = 16384 per wave; 65536 / 16384 = 4 waves
        let est = cdna2().occupancy_estimate(256, 0, 256);
        assert!((est.theoretical - 0.4).abs() < 1e-12);
        assert_eq!(est.limiter, Some(OccupancyLimiter::Registers));
    }

    #[test]
    fn test_occupancy_register_tie_reports_registers() {
        // 102 VGPRs × 64 = 6528 per wave; 65536 / 6528 = 10 = hw slots
        let est = cdna2().occupancy_estimate(102, 0, 256);
        assert_eq!(est.theoretical, 1.0);
        assert_eq!(est.active_waves_per_simd, 10);
        assert_eq!(est.limiter, Some(OccupancyLimiter::Registers));

        // One more register per thread drops below the hardware limit
        let est = cdna2().occupancy_estimate(103, 0, 256);
        assert_eq!(est.active_waves_per_simd, 9);
        assert_eq!(est.limiter, Some(OccupancyLimiter::Registers));
    }

    #[test]
    fn test_occupancy_lds_limited() {
        // 32 KB per block → 2 blocks per CU; 4 waves per block → 8 waves / 4 SIMD = 2
        let est = cdna2().occupancy_estimate(16, 32 * 1024, 256);
        assert!((est.theoretical - 0.2).abs() < 1e-12);
        assert_eq!(est.limiter, Some(OccupancyLimiter::LocalDataShare));
    }

    #[test]
    fn test_occupancy_zero_vgpr_is_closed_failure() {
        let est = cdna2().occupancy_estimate(0, 0, 256);
        assert_eq!(est.theoretical, 0.0);
        assert_eq!(est.limiter, None);
    }

    #[test]
    fn test_occupancy_lds_larger_than_cu() {
        let occ = cdna2().compute_occupancy(32, 128 * 1024, 256);
        assert_eq!(occ, 0.0);
    }

    #[test]
    fn test_peak_compute_cdna2() {
        // 104 CU × 4 SIMD × 64 lanes × 2 × 1.7 GHz
        let flops = cdna2().peak_compute_flops(1700.0);
        assert!((flops - 104.0 * 4.0 * 64.0 * 2.0 * 1.7e9).abs() < 1.0);
        assert!((cdna2().peak_compute_gflops(1700.0) - flops / 1e9).abs() < 1e-6);
    }

    #[test]
    fn test_peak_compute_rdna2_uses_lane_count() {
        let meta = AgentMetadata {
            arch_name: Some("gfx1035".to_string()),
            compute_unit_count: Some(12),
            simd_per_cu: Some(2),
            max_waves_per_cu: Some(32),
            wavefront_size: Some(64),
            max_clock_mhz: Some(2200.0),
        };
        let arch = ArchitectureProfile::from_metadata(&meta).unwrap();
        let expected = 12.0 * 2.0 * 32.0 * 2.0 * 2200.0e6;
        assert!((arch.peak_compute_flops(2200.0) - expected).abs() < 1.0);
    }

    #[test]
    fn test_peak_compute_without_clock() {
        assert_eq!(cdna2().peak_compute_flops(0.0), 0.0);
    }

    #[test]
    fn test_bandwidth_override() {
        let arch = cdna2().with_peak_bandwidth(1200.0);
        assert_eq!(arch.peak_bandwidth(), 1200.0);
        assert_eq!(
            ArchitectureProfile::from_registry("gfx1030", 40)
                .unwrap()
                .peak_bandwidth(),
            50.0
        );
    }

    #[test]
    fn test_effective_clock() {
        let arch = ArchitectureProfile::from_metadata(&cdna3_meta()).unwrap();
        assert_eq!(arch.effective_clock_mhz(None), Some(2100.0));
        assert_eq!(arch.effective_clock_mhz(Some(1500.0)), Some(1500.0));
        assert_eq!(cdna2().effective_clock_mhz(None), None);
    }
}
