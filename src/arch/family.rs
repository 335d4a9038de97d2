//! Supported GPU architecture families and their constant tables
//!
//! - **RDNA2** (gfx103x): Wave32, Radeon RX 6000 series and APUs
//! - **CDNA2** (gfx90x): Wave64, Instinct MI200 series
//! - **CDNA3** (gfx94x): Wave64, Instinct MI300 series
//!
//! The family set is closed. Formulas in [`super::profile`] match on the
//! family tag and read the constants below.

use std::fmt;

use serde::Serialize;

/// Static hardware limits shared by every device of one family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyTable {
    /// Native wavefront size
    pub wave_size: u32,
    /// SIMD units per compute unit
    pub simd_per_cu: u32,
    /// Hardware wave slots per SIMD
    pub max_waves_per_simd: u32,
    /// Vector register file per SIMD (32-bit registers)
    pub vgpr_per_simd: u32,
    /// Scalar register file per SIMD (32-bit registers)
    pub sgpr_per_simd: u32,
    /// Local data share per compute unit in bytes
    pub lds_per_cu_bytes: u32,
    /// Matrix fused-multiply-add instructions available
    pub supports_mfma: bool,
    /// FP32 ALU lanes retired per SIMD per cycle
    pub alu_lanes_per_simd: u32,
    /// Peak DRAM bandwidth assumed until a measured value is supplied (GB/s)
    pub default_peak_bandwidth_gbps: f64,
}

const RDNA2_TABLE: FamilyTable = FamilyTable {
    wave_size: 32,
    simd_per_cu: 2,
    max_waves_per_simd: 16,
    vgpr_per_simd: 16384,
    sgpr_per_simd: 800,
    lds_per_cu_bytes: 65536,
    supports_mfma: false,
    alu_lanes_per_simd: 32,
    // Conservative APU figure
    default_peak_bandwidth_gbps: 50.0,
};

const CDNA2_TABLE: FamilyTable = FamilyTable {
    wave_size: 64,
    simd_per_cu: 4,
    max_waves_per_simd: 10,
    vgpr_per_simd: 65536,
    sgpr_per_simd: 1024,
    lds_per_cu_bytes: 65536,
    supports_mfma: true,
    alu_lanes_per_simd: 64,
    default_peak_bandwidth_gbps: 1638.4,
};

const CDNA3_TABLE: FamilyTable = FamilyTable {
    wave_size: 64,
    simd_per_cu: 4,
    max_waves_per_simd: 8,
    vgpr_per_simd: 65536,
    sgpr_per_simd: 1024,
    lds_per_cu_bytes: 65536,
    supports_mfma: true,
    alu_lanes_per_simd: 64,
    default_peak_bandwidth_gbps: 5300.0,
};

/// GPU architecture family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchFamily {
    Rdna2,
    Cdna2,
    Cdna3,
}

impl ArchFamily {
    /// Every supported family, in registry order
    pub const ALL: [ArchFamily; 3] = [ArchFamily::Rdna2, ArchFamily::Cdna2, ArchFamily::Cdna3];

    /// Resolve a GFX IP identifier (e.g. "gfx90a") to its family
    ///
    /// Returns `None` for identifiers outside the supported set.
    pub fn from_gfx_id(gfx_id: &str) -> Option<Self> {
        let id = gfx_id.trim().to_lowercase();
        match id.as_str() {
            ip if ip.starts_with("gfx103") => Some(ArchFamily::Rdna2),
            ip if ip.starts_with("gfx94") => Some(ArchFamily::Cdna3),
            ip if ip.starts_with("gfx90") => Some(ArchFamily::Cdna2),
            _ => None,
        }
    }

    /// Constant table for this family
    pub fn table(&self) -> &'static FamilyTable {
        match self {
            ArchFamily::Rdna2 => &RDNA2_TABLE,
            ArchFamily::Cdna2 => &CDNA2_TABLE,
            ArchFamily::Cdna3 => &CDNA3_TABLE,
        }
    }

    /// Short lowercase name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            ArchFamily::Rdna2 => "rdna2",
            ArchFamily::Cdna2 => "cdna2",
            ArchFamily::Cdna3 => "cdna3",
        }
    }

    /// Representative GFX identifier for listings
    pub fn canonical_gfx_id(&self) -> &'static str {
        match self {
            ArchFamily::Rdna2 => "gfx1030",
            ArchFamily::Cdna2 => "gfx90a",
            ArchFamily::Cdna3 => "gfx942",
        }
    }
}

impl fmt::Display for ArchFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
