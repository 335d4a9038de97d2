//! Instruction mix analyzer
//!
//! Classifies per-instruction-site rows by functional unit and reduces them
//! into normalized behavioral fractions. The accumulator merge is plain
//! addition, so chunked parallel ingestion gives the same result as a single
//! sequential pass.

use std::fmt;

use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::numeric::safe_ratio;
use crate::trace::InstructionRow;

/// Rows per rayon work item in [`InstructionMixAnalyzer::analyze_parallel`]
pub const PARALLEL_CHUNK_ROWS: usize = 4096;

/// Functional-unit class of an instruction mnemonic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstructionClass {
    Valu,
    Salu,
    Vmem,
    Lds,
    Branch,
    Mfma,
    Other,
}

impl InstructionClass {
    /// All classes, in report order
    pub const ALL: [InstructionClass; 7] = [
        InstructionClass::Valu,
        InstructionClass::Salu,
        InstructionClass::Vmem,
        InstructionClass::Lds,
        InstructionClass::Branch,
        InstructionClass::Mfma,
        InstructionClass::Other,
    ];

    /// First matching rule wins
    pub fn classify(mnemonic: &str) -> Self {
        if mnemonic.starts_with("v_") {
            InstructionClass::Valu
        } else if mnemonic.starts_with("s_") {
            InstructionClass::Salu
        } else if mnemonic.starts_with("global_") || mnemonic.starts_with("flat_") {
            InstructionClass::Vmem
        } else if mnemonic.starts_with("ds_") {
            InstructionClass::Lds
        } else if mnemonic.contains("cbranch") {
            InstructionClass::Branch
        } else if mnemonic.to_ascii_lowercase().contains("mfma") {
            InstructionClass::Mfma
        } else {
            InstructionClass::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InstructionClass::Valu => "VALU",
            InstructionClass::Salu => "SALU",
            InstructionClass::Vmem => "VMEM",
            InstructionClass::Lds => "LDS",
            InstructionClass::Branch => "BRANCH",
            InstructionClass::Mfma => "MFMA",
            InstructionClass::Other => "OTHER",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for InstructionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl Serialize for InstructionClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Raw per-class hit totals plus run-wide cycle totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionClassCounters {
    class_hits: [u64; 7],
    vmem_latency: u64,
    vmem_rows: u64,
    total_latency: u64,
    total_stall: u64,
    total_idle: u64,
    rows: u64,
}

impl InstructionClassCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: &InstructionRow) {
        let class = InstructionClass::classify(&row.mnemonic);
        self.class_hits[class.index()] = self.class_hits[class.index()].saturating_add(row.hit_count);
        if class == InstructionClass::Vmem {
            self.vmem_latency = self.vmem_latency.saturating_add(row.latency_cycles);
            self.vmem_rows += 1;
        }
        self.total_latency = self.total_latency.saturating_add(row.latency_cycles);
        self.total_stall = self.total_stall.saturating_add(row.stall_cycles);
        self.total_idle = self.total_idle.saturating_add(row.idle_cycles);
        self.rows += 1;
    }

    /// Combine two partial aggregates
    pub fn merge(mut self, other: Self) -> Self {
        for (mine, theirs) in self.class_hits.iter_mut().zip(other.class_hits) {
            *mine = mine.saturating_add(theirs);
        }
        self.vmem_latency = self.vmem_latency.saturating_add(other.vmem_latency);
        self.vmem_rows += other.vmem_rows;
        self.total_latency = self.total_latency.saturating_add(other.total_latency);
        self.total_stall = self.total_stall.saturating_add(other.total_stall);
        self.total_idle = self.total_idle.saturating_add(other.total_idle);
        self.rows += other.rows;
        self
    }

    pub fn hits(&self, class: InstructionClass) -> u64 {
        self.class_hits[class.index()]
    }

    pub fn total_hits(&self) -> u64 {
        self.class_hits.iter().fold(0u64, |acc, h| acc.saturating_add(*h))
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_latency
            .saturating_add(self.total_stall)
            .saturating_add(self.total_idle)
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Normalize into a [`InstructionMixResult`]
    pub fn finish(&self) -> InstructionMixResult {
        let total_hits = self.total_hits() as f64;
        let total_cycles = self.total_cycles() as f64;

        let mix = InstructionClass::ALL
            .iter()
            .map(|&class| ClassFraction {
                class,
                hits: self.hits(class),
                fraction: safe_ratio(self.hits(class) as f64, total_hits),
            })
            .collect();

        InstructionMixResult {
            mix,
            stall_fraction: safe_ratio(self.total_stall as f64, total_cycles),
            idle_fraction: safe_ratio(self.total_idle as f64, total_cycles),
            avg_memory_latency: safe_ratio(self.vmem_latency as f64, self.vmem_rows as f64),
            ipc_proxy: safe_ratio(total_hits, total_cycles),
            total_hits: self.total_hits(),
            total_cycles: self.total_cycles(),
            rows: self.rows,
        }
    }
}

/// Fraction of executed instructions in one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassFraction {
    pub class: InstructionClass,
    pub hits: u64,
    pub fraction: f64,
}

/// Normalized instruction mix and stall behavior of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionMixResult {
    /// One entry per class, in [`InstructionClass::ALL`] order
    pub mix: Vec<ClassFraction>,
    pub stall_fraction: f64,
    pub idle_fraction: f64,
    /// Mean latency over VMEM rows, in cycles
    pub avg_memory_latency: f64,
    pub ipc_proxy: f64,
    pub total_hits: u64,
    pub total_cycles: u64,
    pub rows: u64,
}

impl InstructionMixResult {
    pub fn fraction(&self, class: InstructionClass) -> f64 {
        self.mix
            .iter()
            .find(|c| c.class == class)
            .map(|c| c.fraction)
            .unwrap_or(0.0)
    }
}

/// Reduces instruction rows into an [`InstructionMixResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionMixAnalyzer;

impl InstructionMixAnalyzer {
    pub fn new() -> Self {
        InstructionMixAnalyzer
    }

    pub fn accumulate(&self, rows: &[InstructionRow]) -> InstructionClassCounters {
        rows.iter().fold(InstructionClassCounters::new(), |mut acc, row| {
            acc.add_row(row);
            acc
        })
    }

    pub fn analyze(&self, rows: &[InstructionRow]) -> InstructionMixResult {
        let result = self.accumulate(rows).finish();
        log_result(&result);
        result
    }

    /// Chunked ingestion on the rayon pool
    pub fn analyze_parallel(&self, rows: &[InstructionRow]) -> InstructionMixResult {
        let counters = rows
            .par_chunks(PARALLEL_CHUNK_ROWS)
            .fold(InstructionClassCounters::new, |acc, chunk| {
                acc.merge(self.accumulate(chunk))
            })
            .reduce(InstructionClassCounters::new, InstructionClassCounters::merge);
        let result = counters.finish();
        log_result(&result);
        result
    }
}

fn log_result(result: &InstructionMixResult) {
    tracing::debug!(
        rows = result.rows,
        total_hits = result.total_hits,
        stall_fraction = result.stall_fraction,
        avg_memory_latency = result.avg_memory_latency,
        "analyzed instruction mix"
    );
}
