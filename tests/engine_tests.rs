//! Engine façade: bundle loading, configuration and failure modes

mod common;

use std::sync::Arc;

use common::*;
use rocmlens::arch::{AgentMetadata, ArchitectureSource};
use rocmlens::metrics::AnalysisMetrics;
use rocmlens::{AnalysisConfig, DependencyGapPolicy, PerformanceAnalyzer, TraceBundle};

const BUNDLE_JSON: &str = r#"{
    "architecture": { "registry": { "id": "gfx90a", "compute_units": 104 } },
    "kernel": { "name": "reduce", "block": [256, 1, 1] },
    "resources": { "vgpr_per_thread": 48, "lds_bytes": 8192 },
    "timings_ms": [0.51, 0.50, 0.52],
    "dispatches": [
        { "id": 10, "kernel_id": 1, "queue_id": 0, "start": 0, "end": 400 },
        { "id": 11, "kernel_id": 2, "queue_id": 0, "start": 400, "end": 1400 },
        { "id": 12, "kernel_id": 1, "queue_id": 1, "start": 1450, "end": 1650 }
    ],
    "symbols": [
        { "id": 1, "kernel_name": "_Z6reducePf" },
        { "id": 2, "display_name": "scan", "kernel_name": "_Z4scanPf" }
    ],
    "instructions": [
        { "isa": "v_add_f32", "hit": 800, "latency": 900, "stall": 20, "idle": 0 },
        { "isa": "ds_read_b32", "hit": 200, "latency": 400, "stall": 30, "idle": 10 }
    ]
}"#;

fn analyzer() -> PerformanceAnalyzer {
    PerformanceAnalyzer::new(AnalysisConfig::default()).unwrap()
}

#[test]
fn load_bundle_from_file() {
    let file = write_json_file(BUNDLE_JSON).unwrap();
    let bundle = TraceBundle::load(file.path()).unwrap();
    let report = analyzer().analyze(&bundle).unwrap();

    let path = report.critical_path.unwrap();
    assert_eq!(path.path, vec![10, 11, 12]);
    assert_eq!(path.critical_path_ns, 1_600);
    assert_eq!(path.path_symbols(), vec!["_Z6reducePf", "scan", "_Z6reducePf"]);
    assert_eq!(path.dominant_symbol.as_deref(), Some("scan"));

    // Registry profiles carry no clock and no counters were supplied
    assert!(report.roofline.is_none());
    assert!(report.gpu.theoretical_peak_flops.is_none());

    let occupancy = report.occupancy.unwrap();
    assert!(occupancy.theoretical > 0.0 && occupancy.theoretical <= 1.0);
    assert_eq!(report.kernel.and_then(|k| k.name).as_deref(), Some("reduce"));
}

#[test]
fn malformed_bundle_is_io_category() {
    let file = write_json_file("{ not json").unwrap();
    let err = TraceBundle::load(file.path()).unwrap_err();
    assert_eq!(err.category().to_string(), "Io");
}

#[test]
fn unknown_architecture_is_configuration_error() {
    let bundle = TraceBundle::new(registry_source("gfx1100", 96), vec![1.0]);
    let err = analyzer().analyze(&bundle).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("gfx1100"));
}

#[test]
fn missing_metadata_field_is_named() {
    let metadata = AgentMetadata {
        max_clock_mhz: None,
        ..cdna3_metadata()
    };
    let bundle = TraceBundle::new(ArchitectureSource::Metadata(metadata), vec![1.0]);
    let err = analyzer().analyze(&bundle).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("max_clock_mhz"));
}

#[test]
fn critical_path_requires_dispatch_rows() {
    let bundle = TraceBundle::new(registry_source("gfx90a", 104), vec![1.0]);
    assert!(analyzer().critical_path(&bundle).unwrap_err().is_data_not_found());

    let empty = bundle.clone().with_dispatches(Vec::new(), Vec::new());
    assert!(analyzer().critical_path(&empty).unwrap_err().is_data_not_found());

    // The full analysis treats the same absence as an omitted section
    assert!(analyzer().analyze(&bundle).unwrap().critical_path.is_none());
}

#[test]
fn large_instruction_tables_match_sequential() {
    let rows: Vec<_> = (0..60_000u64)
        .map(|i| {
            let mnemonic = if i % 3 == 0 { "global_load_dword" } else { "v_mul_f32" };
            rocmlens::trace::InstructionRow::new(mnemonic, 1 + i % 5, 100 + i % 300, i % 50, i % 3)
        })
        .collect();
    let bundle = TraceBundle::new(registry_source("gfx942", 304), vec![1.0]).with_instructions(rows.clone());
    let report = analyzer().analyze(&bundle).unwrap();

    let sequential = rocmlens::analysis::InstructionMixAnalyzer::new().analyze(&rows);
    assert_eq!(report.instruction_mix, Some(sequential));
}

#[test]
fn metrics_count_runs_and_failures() {
    let metrics = Arc::new(AnalysisMetrics::new());
    let analyzer = analyzer().with_metrics(Arc::clone(&metrics));

    analyzer.analyze(&full_bundle()).unwrap();
    let mut broken = full_bundle();
    broken.timings_ms.clear();
    assert!(analyzer.analyze(&broken).is_err());

    let export = metrics.export().unwrap();
    assert!(export.contains("rocmlens_analyses_total 2"));
    assert!(export.contains("rocmlens_analyses_failed_total 1"));
    assert!(export.contains("rocmlens_dispatches_analyzed_total 3"));
    assert!(export.contains("rocmlens_analysis_duration_seconds_count 2"));
}

#[test]
#[serial]
fn env_selects_fixed_gap_policy() {
    std::env::set_var("ROCMLENS_GAP_POLICY", "fixed");
    std::env::set_var("ROCMLENS_GAP_FIXED_NS", "20");
    let config = AnalysisConfig::from_env();
    std::env::remove_var("ROCMLENS_GAP_POLICY");
    std::env::remove_var("ROCMLENS_GAP_FIXED_NS");

    let config = config.unwrap();
    assert_eq!(config.dependency_gap, DependencyGapPolicy::Fixed { threshold_ns: 20 });

    let file = write_json_file(BUNDLE_JSON).unwrap();
    let bundle = TraceBundle::load(file.path()).unwrap();
    let path = PerformanceAnalyzer::new(config).unwrap().critical_path(&bundle).unwrap();
    // 50ns gap to dispatch 12 exceeds the 20ns cutoff
    assert_eq!(path.path, vec![10, 11]);
}

#[test]
#[serial]
fn env_rejects_malformed_numbers() {
    std::env::set_var("ROCMLENS_BANDWIDTH_GBPS", "fast");
    let result = AnalysisConfig::from_env();
    std::env::remove_var("ROCMLENS_BANDWIDTH_GBPS");
    assert!(result.unwrap_err().is_configuration_error());
}
