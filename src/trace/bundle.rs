//! Trace bundle: every input of one analysis run in a single JSON document
//!
//! ```json
//! {
//!   "architecture": { "registry": { "id": "gfx90a", "compute_units": 104 } },
//!   "kernel": { "name": "gemm", "grid": [1024, 1, 1], "block": [256, 1, 1] },
//!   "resources": { "vgpr_per_thread": 64, "sgpr_per_wave": 32, "lds_bytes": 0 },
//!   "timings_ms": [1.21, 1.19, 1.22],
//!   "dispatches": [ { "id": 1, "kernel_symbol_id": 1, "queue_id": 0, "start_ns": 0, "end_ns": 10 } ],
//!   "symbols": [ { "id": 1, "display_name": "gemm" } ],
//!   "instructions": [ { "mnemonic": "v_fma_f32", "hit_count": 10, "latency_cycles": 40,
//!                       "stall_cycles": 4, "idle_cycles": 0 } ],
//!   "counters": { "SQ_INSTS_VALU": 1.0e9, "TCC_READ_BYTES": 4.0e8 }
//! }
//! ```
//!
//! Optional inputs that are absent switch off their report sections.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::counters::{InstructionRow, ThroughputCounters};
use super::dispatch::DispatchRow;
use super::symbols::KernelSymbolRow;
use crate::arch::ArchitectureSource;
use crate::error::{io_context, LensResult};

/// Launch geometry of the analyzed kernel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelLaunch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<[u32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<[u32; 3]>,
}

impl KernelLaunch {
    /// Threads per block, when the block shape is known
    pub fn threads_per_block(&self) -> Option<u32> {
        self.block
            .map(|[x, y, z]| x.saturating_mul(y).saturating_mul(z))
    }
}

/// Per-kernel resource footprint reported by the compiler/collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vgpr_per_thread: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sgpr_per_wave: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lds_bytes: Option<u32>,
}

/// All inputs of one analysis run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceBundle {
    pub architecture: ArchitectureSource,
    #[serde(default)]
    pub kernel: Option<KernelLaunch>,
    #[serde(default)]
    pub resources: Option<KernelResources>,
    /// Repeated, sequentially measured run times in milliseconds
    #[serde(default)]
    pub timings_ms: Vec<f64>,
    #[serde(default)]
    pub dispatches: Option<Vec<DispatchRow>>,
    #[serde(default)]
    pub symbols: Vec<KernelSymbolRow>,
    #[serde(default)]
    pub instructions: Option<Vec<InstructionRow>>,
    #[serde(default)]
    pub counters: Option<ThroughputCounters>,
}

impl TraceBundle {
    /// Minimal bundle: architecture plus run timings
    pub fn new(architecture: ArchitectureSource, timings_ms: Vec<f64>) -> Self {
        TraceBundle {
            architecture,
            kernel: None,
            resources: None,
            timings_ms,
            dispatches: None,
            symbols: Vec::new(),
            instructions: None,
            counters: None,
        }
    }

    pub fn with_kernel(mut self, kernel: KernelLaunch) -> Self {
        self.kernel = Some(kernel);
        self
    }

    pub fn with_resources(mut self, resources: KernelResources) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_dispatches(mut self, dispatches: Vec<DispatchRow>, symbols: Vec<KernelSymbolRow>) -> Self {
        self.dispatches = Some(dispatches);
        self.symbols = symbols;
        self
    }

    pub fn with_instructions(mut self, instructions: Vec<InstructionRow>) -> Self {
        self.instructions = Some(instructions);
        self
    }

    pub fn with_counters(mut self, counters: ThroughputCounters) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Parse a bundle from JSON text
    pub fn from_json(text: &str) -> LensResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a bundle file
    pub fn load(path: impl AsRef<Path>) -> LensResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| io_context(e, &format!("reading trace bundle {}", path.display())))?;
        Self::from_json(&text)
    }
}
