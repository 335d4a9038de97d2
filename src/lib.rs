//! rocmlens - GPU kernel performance analysis
//!
//! Turns execution traces of AMD GPU kernels into a reproducible
//! performance diagnosis: the critical path through the dispatch timeline,
//! the instruction mix and stall behavior, the roofline bound, and a single
//! bottleneck verdict fusing all of them.
//!
//! ```rust
//! use rocmlens::arch::ArchitectureSource;
//! use rocmlens::trace::{DispatchRow, KernelSymbolRow, TraceBundle};
//! use rocmlens::{AnalysisConfig, PerformanceAnalyzer};
//!
//! let bundle = TraceBundle::new(
//!     ArchitectureSource::Registry { id: "gfx90a".into(), compute_units: 104 },
//!     vec![1.0, 1.01, 0.99],
//! )
//! .with_dispatches(
//!     vec![DispatchRow::new(1, 1, 0, 0, 10), DispatchRow::new(2, 2, 0, 10, 30)],
//!     vec![KernelSymbolRow::new(1, Some("a"), None), KernelSymbolRow::new(2, Some("b"), None)],
//! );
//!
//! let report = PerformanceAnalyzer::new(AnalysisConfig::default())?.analyze(&bundle)?;
//! let path = report.critical_path.as_ref().map(|p| p.critical_path_ns);
//! assert_eq!(path, Some(30));
//! # Ok::<(), rocmlens::LensError>(())
//! ```

pub mod analysis;
pub mod arch;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod numeric;
pub mod report;
pub mod trace;

pub use arch::{ArchFamily, ArchitectureProfile};
pub use config::{AnalysisConfig, DependencyGapPolicy};
pub use engine::PerformanceAnalyzer;
pub use error::{ErrorCategory, LensError, LensResult};
pub use report::{PerformanceReport, ReportAssembler};
pub use trace::TraceBundle;
