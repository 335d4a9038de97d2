//! Critical path solver
//!
//! Longest duration-weighted path through the dispatch DAG, computed by
//! dynamic programming over a topological order, then broken down per
//! dispatch and per kernel symbol.
//!
//! Ties are resolved by position, never by hash order: the end node is the
//! first maximum in `(start_ns, id)` node order, and the dominant symbol is
//! the first maximum in first-seen order along the path.

use serde::Serialize;

use super::graph::{DispatchGraph, EdgeKind};
use crate::config::DependencyGapPolicy;
use crate::error::LensResult;
use crate::numeric::safe_ratio;
use crate::trace::{records_from_rows, DispatchRow, KernelSymbolRow, SymbolTable};

/// One dispatch on the critical path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchContribution {
    pub dispatch_id: u64,
    pub symbol: String,
    pub duration_ns: u64,
    /// `duration_ns / critical_path_ns`
    pub fraction: f64,
}

/// Aggregated time of one kernel symbol along the critical path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolContribution {
    pub symbol: String,
    pub total_ns: u64,
    /// `total_ns / critical_path_ns`
    pub fraction: f64,
}

/// Longest path through the dispatch graph and its breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPathResult {
    pub critical_path_ns: u64,
    /// Dispatch ids in chronological order
    pub path: Vec<u64>,
    /// Path dispatches in path order
    pub dispatch_contributions: Vec<DispatchContribution>,
    /// Symbols in first-seen order along the path
    pub symbol_contributions: Vec<SymbolContribution>,
    pub dominant_symbol: Option<String>,
    pub dominant_symbol_fraction: f64,
    /// Longest single dispatch on the path
    pub dominant_dispatch: Option<DispatchContribution>,
    pub serial_edges: usize,
    pub inferred_edges: usize,
    /// Gap threshold that was applied for cross-queue inference
    pub dependency_threshold_ns: u64,
}

impl CriticalPathResult {
    /// Result for a trace without dispatches
    pub fn empty(dependency_threshold_ns: u64) -> Self {
        CriticalPathResult {
            critical_path_ns: 0,
            path: Vec::new(),
            dispatch_contributions: Vec::new(),
            symbol_contributions: Vec::new(),
            dominant_symbol: None,
            dominant_symbol_fraction: 0.0,
            dominant_dispatch: None,
            serial_edges: 0,
            inferred_edges: 0,
            dependency_threshold_ns,
        }
    }

    /// Symbol names along the path, one per dispatch
    pub fn path_symbols(&self) -> Vec<&str> {
        self.dispatch_contributions
            .iter()
            .map(|c| c.symbol.as_str())
            .collect()
    }

    /// Contribution of a symbol, 0.0 when it is not on the path
    pub fn symbol_fraction(&self, symbol: &str) -> f64 {
        self.symbol_contributions
            .iter()
            .find(|c| c.symbol == symbol)
            .map(|c| c.fraction)
            .unwrap_or(0.0)
    }
}

/// Longest-path solver over a [`DispatchGraph`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalPathSolver;

impl CriticalPathSolver {
    pub fn new() -> Self {
        CriticalPathSolver
    }

    pub fn solve(&self, graph: &DispatchGraph, symbols: &SymbolTable) -> CriticalPathResult {
        if graph.is_empty() {
            return CriticalPathResult::empty(graph.threshold_ns());
        }

        let nodes = graph.nodes();
        let order = graph.topological_order();

        let mut dp: Vec<u64> = nodes.iter().map(|r| r.duration_ns()).collect();
        let mut parent: Vec<Option<usize>> = vec![None; nodes.len()];

        for &u in &order {
            for &v in graph.successors(u) {
                let candidate = dp[u].saturating_add(nodes[v].duration_ns());
                if candidate > dp[v] {
                    dp[v] = candidate;
                    parent[v] = Some(u);
                }
            }
        }

        // First maximum in node order
        let (end_node, critical_path_ns) = dp.iter().copied().enumerate().fold(
            (0usize, dp[0]),
            |best, (idx, len)| if len > best.1 { (idx, len) } else { best },
        );

        let mut path_nodes = vec![end_node];
        let mut cursor = end_node;
        while let Some(prev) = parent[cursor] {
            path_nodes.push(prev);
            cursor = prev;
        }
        path_nodes.reverse();

        let dispatch_contributions: Vec<DispatchContribution> = path_nodes
            .iter()
            .map(|&idx| {
                let record = &nodes[idx];
                DispatchContribution {
                    dispatch_id: record.id(),
                    symbol: symbols.name_of(record.symbol_id()).to_string(),
                    duration_ns: record.duration_ns(),
                    fraction: safe_ratio(record.duration_ns() as f64, critical_path_ns as f64),
                }
            })
            .collect();

        let symbol_contributions = aggregate_by_symbol(&dispatch_contributions, critical_path_ns);

        let dominant = symbol_contributions
            .iter()
            .fold(None::<&SymbolContribution>, |best, c| match best {
                Some(b) if b.total_ns >= c.total_ns => Some(b),
                _ => Some(c),
            });

        let dominant_dispatch = dispatch_contributions
            .iter()
            .fold(None::<&DispatchContribution>, |best, c| match best {
                Some(b) if b.duration_ns >= c.duration_ns => Some(b),
                _ => Some(c),
            })
            .cloned();

        let result = CriticalPathResult {
            critical_path_ns,
            path: dispatch_contributions.iter().map(|c| c.dispatch_id).collect(),
            dominant_symbol: dominant.map(|c| c.symbol.clone()),
            dominant_symbol_fraction: dominant.map(|c| c.fraction).unwrap_or(0.0),
            dominant_dispatch,
            serial_edges: graph.edge_count(EdgeKind::Serial),
            inferred_edges: graph.edge_count(EdgeKind::Inferred),
            dependency_threshold_ns: graph.threshold_ns(),
            dispatch_contributions,
            symbol_contributions,
        };

        tracing::debug!(
            critical_path_ns = result.critical_path_ns,
            path_len = result.path.len(),
            dominant = result.dominant_symbol.as_deref().unwrap_or("-"),
            "solved critical path"
        );

        result
    }
}

/// Sum durations per symbol, keeping first-seen order along the path
fn aggregate_by_symbol(
    contributions: &[DispatchContribution],
    critical_path_ns: u64,
) -> Vec<SymbolContribution> {
    let mut totals: Vec<SymbolContribution> = Vec::new();
    for c in contributions {
        match totals.iter_mut().find(|t| t.symbol == c.symbol) {
            Some(total) => total.total_ns += c.duration_ns,
            None => totals.push(SymbolContribution {
                symbol: c.symbol.clone(),
                total_ns: c.duration_ns,
                fraction: 0.0,
            }),
        }
    }

    for total in &mut totals {
        total.fraction = safe_ratio(total.total_ns as f64, critical_path_ns as f64);
    }
    totals
}

/// Validate rows, build the graph and solve it
///
/// Zero rows produce an empty result, not an error.
pub fn analyze_critical_path(
    dispatches: &[DispatchRow],
    symbols: &[KernelSymbolRow],
    policy: &DependencyGapPolicy,
) -> LensResult<CriticalPathResult> {
    let records = records_from_rows(dispatches)?;
    let graph = DispatchGraph::build(&records, policy);
    Ok(CriticalPathSolver::new().solve(&graph, &SymbolTable::from_rows(symbols)))
}

/// Like [`analyze_critical_path`], for callers where dispatch rows are the
/// primary input: missing or empty rows are [`DataNotFound`](crate::LensError::DataNotFound).
pub fn require_critical_path(
    dispatches: Option<&[DispatchRow]>,
    symbols: &[KernelSymbolRow],
    policy: &DependencyGapPolicy,
) -> LensResult<CriticalPathResult> {
    match dispatches {
        Some(rows) if !rows.is_empty() => analyze_critical_path(rows, symbols, policy),
        _ => Err(crate::data_not_found!("no kernel dispatch rows in trace")),
    }
}
