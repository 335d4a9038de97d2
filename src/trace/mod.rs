//! Trace input schemas
//!
//! These types describe what the trace collector hands to the engine. They
//! carry no analysis logic beyond validation.
//!
//! - [`dispatch`] - dispatch table rows and validated [`DispatchRecord`]s
//! - [`symbols`] - kernel symbol rows and name resolution
//! - [`counters`] - instruction-site rows and throughput counters
//! - [`bundle`] - the JSON document bundling one run's inputs

pub mod bundle;
pub mod counters;
pub mod dispatch;
pub mod symbols;

pub use bundle::{KernelLaunch, KernelResources, TraceBundle};
pub use counters::{InstructionRow, ThroughputCounters};
pub use dispatch::{records_from_rows, total_span_ns, DispatchRecord, DispatchRow};
pub use symbols::{KernelSymbol, KernelSymbolRow, SymbolTable, UNKNOWN_SYMBOL};
