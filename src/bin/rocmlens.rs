use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rocmlens::analysis::CriticalPathResult;
use rocmlens::arch::{ArchFamily, ArchitectureProfile};
use rocmlens::config::{AnalysisConfig, DependencyGapPolicy};
use rocmlens::logging::init_logging_from_env;
use rocmlens::metrics::AnalysisMetrics;
use rocmlens::{PerformanceAnalyzer, PerformanceReport, TraceBundle};

#[derive(Parser, Debug)]
#[command(name = "rocmlens", version)]
#[command(about = "Critical path, instruction mix and bottleneck analysis of GPU kernel traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GapPolicyArg {
    /// max(50us, 1% of the trace span)
    ScaleAware,
    /// Fixed cutoff (see --gap-fixed-ns)
    Fixed,
}

#[derive(clap::Args, Debug)]
struct AnalysisArgs {
    /// Cross-queue dependency inference policy (defaults to ROCMLENS_GAP_POLICY or scale-aware)
    #[arg(long, value_enum)]
    gap_policy: Option<GapPolicyArg>,
    /// Cutoff for the fixed policy in nanoseconds (rejected under scale-aware)
    #[arg(long)]
    gap_fixed_ns: Option<u64>,
    /// Measured peak memory bandwidth in GB/s
    #[arg(long)]
    bandwidth_gbps: Option<f64>,
    /// Clock for the peak compute ceiling in MHz
    #[arg(long)]
    clock_mhz: Option<f64>,
}

impl AnalysisArgs {
    fn into_config(self) -> anyhow::Result<AnalysisConfig> {
        let mut config = AnalysisConfig::from_env()?;
        match self.gap_policy {
            Some(GapPolicyArg::ScaleAware) => config.dependency_gap = DependencyGapPolicy::default(),
            Some(GapPolicyArg::Fixed) => {
                if !matches!(config.dependency_gap, DependencyGapPolicy::Fixed { .. }) {
                    config.dependency_gap = DependencyGapPolicy::legacy_fixed();
                }
            }
            None => {}
        }
        // Applies whether the fixed policy came from the flag or ROCMLENS_GAP_POLICY
        if let Some(threshold_ns) = self.gap_fixed_ns {
            config = config.with_fixed_gap_ns(threshold_ns)?;
        }
        if let Some(gbps) = self.bandwidth_gbps {
            config = config.with_bandwidth_override(gbps);
        }
        if let Some(mhz) = self.clock_mhz {
            config = config.with_clock_mhz(mhz);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full analysis of a trace bundle
    Analyze {
        /// Trace bundle JSON file
        bundle: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Print Prometheus metrics after the report
        #[arg(long)]
        metrics: bool,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Critical path of the dispatch timeline only
    CriticalPath {
        /// Trace bundle JSON file
        bundle: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Theoretical occupancy of a kernel configuration
    Occupancy {
        /// GFX identifier, e.g. gfx90a
        #[arg(long)]
        arch: String,
        /// Compute unit count
        #[arg(long)]
        cus: u32,
        /// Vector registers per thread
        #[arg(long)]
        vgpr: u32,
        /// LDS bytes per block
        #[arg(long, default_value_t = 0)]
        lds: u32,
        /// Threads per block
        #[arg(long)]
        threads: u32,
    },
    /// Show the capability profile of an architecture
    Arch {
        /// GFX identifier; lists supported families when omitted
        #[arg(long)]
        arch: Option<String>,
        /// Compute unit count
        #[arg(long, default_value_t = 1)]
        cus: u32,
        /// Clock for the peak compute figure in MHz
        #[arg(long)]
        clock_mhz: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging_from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            bundle,
            json,
            metrics,
            analysis,
        } => {
            let trace = load_bundle(&bundle)?;
            let registry = Arc::new(AnalysisMetrics::new());
            let analyzer =
                PerformanceAnalyzer::new(analysis.into_config()?)?.with_metrics(Arc::clone(&registry));
            let report = analyzer.analyze(&trace)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }
            if metrics {
                print!("{}", registry.export()?);
            }
        }
        Commands::CriticalPath {
            bundle,
            json,
            analysis,
        } => {
            let trace = load_bundle(&bundle)?;
            let result = PerformanceAnalyzer::new(analysis.into_config()?)?.critical_path(&trace)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_critical_path(&result);
            }
        }
        Commands::Occupancy {
            arch,
            cus,
            vgpr,
            lds,
            threads,
        } => {
            let profile = ArchitectureProfile::from_registry(&arch, cus)?;
            let estimate = profile.occupancy_estimate(vgpr, lds, threads);
            println!("Architecture:      {} ({})", profile.arch_id, profile.family);
            println!("Occupancy:         {:.1}%", estimate.theoretical * 100.0);
            println!(
                "Waves per SIMD:    {} of {}",
                estimate.active_waves_per_simd, profile.max_waves_per_simd
            );
            match estimate.limiter {
                Some(limiter) => println!("Limited by:        {}", limiter),
                None => println!("Limited by:        no vector registers declared"),
            }
        }
        Commands::Arch {
            arch,
            cus,
            clock_mhz,
        } => match arch {
            Some(id) => print_arch(&ArchitectureProfile::from_registry(&id, cus)?, clock_mhz),
            None => {
                for family in ArchFamily::ALL {
                    let table = family.table();
                    println!(
                        "{:<6} {:<8} wave{:<3} {} SIMD/CU  {} waves/SIMD  MFMA: {}",
                        family.name(),
                        family.canonical_gfx_id(),
                        table.wave_size,
                        table.simd_per_cu,
                        table.max_waves_per_simd,
                        if table.supports_mfma { "yes" } else { "no" },
                    );
                }
            }
        },
    }
    Ok(())
}

fn load_bundle(path: &PathBuf) -> anyhow::Result<TraceBundle> {
    TraceBundle::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn print_arch(profile: &ArchitectureProfile, clock_mhz: Option<f64>) {
    println!("Architecture:      {} ({})", profile.arch_id, profile.family);
    println!("Compute units:     {}", profile.compute_units);
    println!("Wave size:         {}", profile.wave_size);
    println!("SIMD per CU:       {}", profile.simd_per_cu);
    println!("Waves per SIMD:    {}", profile.max_waves_per_simd);
    println!("VGPR per SIMD:     {}", profile.vgpr_per_simd);
    println!("LDS per CU:        {} bytes", profile.lds_per_cu_bytes);
    println!("MFMA:              {}", if profile.supports_mfma { "yes" } else { "no" });
    println!("Peak bandwidth:    {:.1} GB/s", profile.peak_bandwidth());
    if let Some(mhz) = clock_mhz {
        println!("Peak compute:      {:.1} GFLOP/s @ {} MHz", profile.peak_compute_gflops(mhz), mhz);
    }
}

fn print_critical_path(result: &CriticalPathResult) {
    println!("Critical path:     {} ns over {} dispatches", result.critical_path_ns, result.path.len());
    println!(
        "Inferred edges:    {} (threshold {} ns), serial edges: {}",
        result.inferred_edges, result.dependency_threshold_ns, result.serial_edges
    );
    if let Some(symbol) = &result.dominant_symbol {
        println!(
            "Dominant kernel:   {} ({:.1}%)",
            symbol,
            result.dominant_symbol_fraction * 100.0
        );
    }
    for contribution in &result.symbol_contributions {
        println!(
            "  {:<40} {:>12} ns  {:>5.1}%",
            contribution.symbol,
            contribution.total_ns,
            contribution.fraction * 100.0
        );
    }
}

fn print_report(report: &PerformanceReport) {
    println!("GPU:               {} ({}, {} CUs)", report.gpu.architecture, report.gpu.family, report.gpu.compute_units);
    if let Some(name) = report.kernel.as_ref().and_then(|k| k.name.as_deref()) {
        println!("Kernel:            {}", name);
    }
    println!(
        "Runtime:           {:.4} ms +/- {:.4} ({}, {} runs)",
        report.runtime.mean_ms, report.runtime.std_ms, report.runtime.stability, report.runtime.runs
    );
    if let Some(occupancy) = &report.occupancy {
        println!("Occupancy:         {:.1}%", occupancy.theoretical * 100.0);
    }
    if let Some(roofline) = &report.roofline {
        println!(
            "Roofline:          {}-bound, AI {:.3} FLOP/B, {:.1} GFLOP/s, {:.1} GB/s",
            roofline.bound, roofline.arithmetic_intensity, roofline.achieved_gflops, roofline.achieved_bandwidth
        );
    }
    match &report.critical_path {
        Some(path) => print_critical_path(path),
        None => println!("Critical path:     no dispatch trace supplied"),
    }
    match &report.instruction_mix {
        Some(mix) => {
            println!(
                "Stall fraction:    {:.3}  idle {:.3}  IPC proxy {:.3}  VMEM latency {:.1}",
                mix.stall_fraction, mix.idle_fraction, mix.ipc_proxy, mix.avg_memory_latency
            );
            for class in &mix.mix {
                println!("  {:<8} {:>6.2}%", class.class, class.fraction * 100.0);
            }
        }
        None => println!("Instruction mix:   no instruction trace supplied"),
    }
    if let Some(verdict) = &report.bottleneck {
        println!("Bottleneck:        {} (confidence {:.2})", verdict.primary, verdict.confidence);
        for reason in &verdict.reasoning {
            println!("  - {}", reason);
        }
    }
    if let Some(score) = &report.optimization {
        println!(
            "Headroom:          {:.1}%, est. speedup {:.2}x, priority {:.3}",
            score.headroom_fraction * 100.0,
            score.estimated_speedup,
            score.priority_score
        );
    }
}
