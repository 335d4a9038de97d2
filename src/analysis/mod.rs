//! Analysis stages
//!
//! Every stage is a synchronous pure function over in-memory inputs. Stages
//! never perform I/O and never touch shared state.
//!
//! - [`graph`] - dispatch dependency DAG with serial and inferred edges
//! - [`critical_path`] - longest path and its per-dispatch/per-symbol breakdown
//! - [`instruction_mix`] - functional-unit mix and stall fractions
//! - [`roofline`] - compute vs memory boundedness
//! - [`bottleneck`] - ordered rule fusion into one verdict
//! - [`stability`] - run-to-run timing variation
//! - [`score`] - optimization priority

pub mod bottleneck;
pub mod critical_path;
pub mod graph;
pub mod instruction_mix;
pub mod roofline;
pub mod score;
pub mod stability;

pub use bottleneck::{classify, BottleneckLabel, BottleneckSignals, BottleneckVerdict};
pub use critical_path::{
    analyze_critical_path, require_critical_path, CriticalPathResult, CriticalPathSolver,
    DispatchContribution, SymbolContribution,
};
pub use graph::{DependencyEdge, DispatchGraph, EdgeKind};
pub use instruction_mix::{
    ClassFraction, InstructionClass, InstructionClassCounters, InstructionMixAnalyzer,
    InstructionMixResult,
};
pub use roofline::{RooflineBound, RooflineCalculator, RooflineInput, RooflineResult};
pub use score::{optimization_score, OptimizationScore};
pub use stability::{summarize_runs, RunStability, StabilityClass};
