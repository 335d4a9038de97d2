//! Trace fixtures

use rocmlens::arch::{AgentMetadata, ArchitectureSource};
use rocmlens::trace::{
    DispatchRow, InstructionRow, KernelLaunch, KernelResources, KernelSymbolRow, ThroughputCounters,
    TraceBundle,
};

/// `(symbol_id, queue_id, start_ns, end_ns)` per dispatch; ids are 1-based positions
pub fn dispatches(layout: &[(u64, u64, u64, u64)]) -> Vec<DispatchRow> {
    layout.iter()
        .enumerate()
        .map(|(i, &(symbol, queue, start, end))| DispatchRow::new(i as u64 + 1, symbol, queue, start, end))
        .collect()
}

/// Symbol table with display names
pub fn symbols(names: &[(u64, &str)]) -> Vec<KernelSymbolRow> {
    names
        .iter()
        .map(|&(id, name)| KernelSymbolRow::new(id, Some(name), None))
        .collect()
}

/// Symbols 1, 2, 3 named A, B, C
pub fn abc_symbols() -> Vec<KernelSymbolRow> {
    symbols(&[(1, "A"), (2, "B"), (3, "C")])
}

pub fn registry_source(id: &str, compute_units: u32) -> ArchitectureSource {
    ArchitectureSource::Registry {
        id: id.to_string(),
        compute_units,
    }
}

/// MI300X-like agent record with a known clock
pub fn cdna3_metadata() -> AgentMetadata {
    AgentMetadata {
        arch_name: Some("gfx942".to_string()),
        compute_unit_count: Some(304),
        simd_per_cu: Some(4),
        max_waves_per_cu: Some(32),
        wavefront_size: Some(64),
        max_clock_mhz: Some(2100.0),
    }
}

/// Memory-latency-heavy instruction table
pub fn latency_bound_instructions() -> Vec<InstructionRow> {
    vec![
        InstructionRow::new("v_fma_f32", 700, 1_400, 900, 50),
        InstructionRow::new("global_load_dwordx4", 100, 4_000, 3_500, 200),
        InstructionRow::new("s_waitcnt", 150, 300, 400, 0),
        InstructionRow::new("s_cbranch_scc0", 50, 100, 50, 0),
    ]
}

/// Counters for a low-intensity streaming kernel
pub fn streaming_counters() -> ThroughputCounters {
    ThroughputCounters::new()
        .with_counter("SQ_INSTS_VALU", 1.0e8)
        .with_counter("TCC_READ_BYTES", 3.2e9)
        .with_counter("TCC_WRITE_BYTES", 1.6e9)
}

pub fn kernel_launch() -> KernelLaunch {
    KernelLaunch {
        name: Some("stream_triad".to_string()),
        grid: Some([4096, 1, 1]),
        block: Some([256, 1, 1]),
    }
}

pub fn kernel_resources() -> KernelResources {
    KernelResources {
        vgpr_per_thread: Some(32),
        sgpr_per_wave: Some(24),
        lds_bytes: Some(0),
    }
}

/// Bundle with every optional input present
pub fn full_bundle() -> TraceBundle {
    TraceBundle::new(
        ArchitectureSource::Metadata(cdna3_metadata()),
        vec![2.00, 2.02, 1.98, 2.01],
    )
    .with_kernel(kernel_launch())
    .with_resources(kernel_resources())
    .with_dispatches(
        dispatches(&[(1, 1, 0, 10), (2, 2, 10, 30), (3, 3, 31, 60)]),
        abc_symbols(),
    )
    .with_instructions(latency_bound_instructions())
    .with_counters(streaming_counters())
}
