//! Dispatch dependency graph
//!
//! Builds a DAG over dispatch records from two kinds of edges:
//!
//! - **Serial**: consecutive dispatches on the same queue.
//! - **Inferred**: for each dispatch, the cross-queue dispatch that finished
//!   most recently before it started, if the gap is within the threshold of
//!   the configured [`DependencyGapPolicy`].
//!
//! Nodes are kept in `(start_ns, id)` order and every edge points forward in
//! that order, so the graph is acyclic by construction. An inferred edge
//! needs `source.end <= target.start`, which already implies
//! `source.start <= target.start`; when the two starts coincide (zero-length
//! source) the id decides.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::Serialize;

use crate::config::DependencyGapPolicy;
use crate::trace::{total_span_ns, DispatchRecord};

/// Why an edge exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Same-queue ordering
    Serial,
    /// Cross-queue dependency inferred from timing
    Inferred,
}

/// Directed dependency between two dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEdge {
    pub source: u64,
    pub target: u64,
    pub kind: EdgeKind,
}

/// Acyclic dependency graph over one run's dispatches
#[derive(Debug, Clone)]
pub struct DispatchGraph {
    /// Records in `(start_ns, id)` order
    nodes: Vec<DispatchRecord>,
    index_of: HashMap<u64, usize>,
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
    edges: Vec<DependencyEdge>,
    threshold_ns: u64,
}

impl DispatchGraph {
    /// Build the graph for `records` using `policy` for cross-queue inference
    pub fn build(records: &[DispatchRecord], policy: &DependencyGapPolicy) -> Self {
        let mut nodes = records.to_vec();
        nodes.sort_by_key(|r| (r.start_ns(), r.id()));

        let index_of = nodes
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id(), idx))
            .collect();

        let threshold_ns = policy.threshold_ns(total_span_ns(&nodes));

        let mut graph = DispatchGraph {
            successors: vec![Vec::new(); nodes.len()],
            in_degree: vec![0; nodes.len()],
            nodes,
            index_of,
            edges: Vec::new(),
            threshold_ns,
        };

        let queues = graph.queue_members();
        graph.add_serial_edges(&queues);
        graph.add_inferred_edges(&queues);

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            inferred = graph.edge_count(EdgeKind::Inferred),
            threshold_ns = graph.threshold_ns,
            "built dispatch graph"
        );

        graph
    }

    /// Node indices per queue, each list in node order
    fn queue_members(&self) -> BTreeMap<u64, Vec<usize>> {
        let mut queues: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (idx, record) in self.nodes.iter().enumerate() {
            queues.entry(record.queue_id()).or_default().push(idx);
        }
        queues
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: EdgeKind) {
        debug_assert!(from < to, "edges must point forward in node order");
        self.successors[from].push(to);
        self.in_degree[to] += 1;
        self.edges.push(DependencyEdge {
            source: self.nodes[from].id(),
            target: self.nodes[to].id(),
            kind,
        });
    }

    fn add_serial_edges(&mut self, queues: &BTreeMap<u64, Vec<usize>>) {
        for members in queues.values() {
            for pair in members.windows(2) {
                self.add_edge(pair[0], pair[1], EdgeKind::Serial);
            }
        }
    }

    fn add_inferred_edges(&mut self, queues: &BTreeMap<u64, Vec<usize>>) {
        // Per queue: (end_ns, node index) sorted ascending
        let finish_order: Vec<(u64, Vec<(u64, usize)>)> = queues
            .iter()
            .map(|(&queue, members)| {
                let mut ends: Vec<(u64, usize)> = members
                    .iter()
                    .map(|&idx| (self.nodes[idx].end_ns(), idx))
                    .collect();
                ends.sort_unstable();
                (queue, ends)
            })
            .collect();

        for target in 0..self.nodes.len() {
            let record = self.nodes[target];

            let best = finish_order
                .iter()
                .filter(|(queue, _)| *queue != record.queue_id())
                .filter_map(|(_, ends)| latest_finisher(ends, record.start_ns(), target))
                .map(|(end, idx)| (record.start_ns() - end, idx))
                .min();

            if let Some((gap, source)) = best {
                if gap <= self.threshold_ns {
                    self.add_edge(source, target, EdgeKind::Inferred);
                }
            }
        }
    }

    /// Records in `(start_ns, id)` order
    pub fn nodes(&self) -> &[DispatchRecord] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All edges, serial edges first
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    /// Gap threshold resolved for this trace
    pub fn threshold_ns(&self) -> u64 {
        self.threshold_ns
    }

    /// Node index of a dispatch id
    pub fn index_of(&self, dispatch_id: u64) -> Option<usize> {
        self.index_of.get(&dispatch_id).copied()
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.successors[idx]
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_degree[idx]
    }

    /// Topological order of node indices (Kahn's algorithm)
    ///
    /// Ready nodes are released in node order, so the result is deterministic.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut remaining = self.in_degree.clone();
        let mut ready: VecDeque<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(idx, _)| idx)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = ready.pop_front() {
            order.push(node);
            for &next in &self.successors[node] {
                remaining[next] -= 1;
                if remaining[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        debug_assert_eq!(order.len(), self.nodes.len(), "dispatch graph has a cycle");
        order
    }
}

/// Latest-finishing entry with `end <= start` and node index `< before`
///
/// Among entries sharing that end time the smallest node index wins.
fn latest_finisher(ends: &[(u64, usize)], start: u64, before: usize) -> Option<(u64, usize)> {
    let mut upper = ends.partition_point(|&(end, _)| end <= start);
    while upper > 0 {
        let run_end = ends[upper - 1].0;
        let run_start = ends[..upper].partition_point(|&(end, _)| end < run_end);
        if let Some(&hit) = ends[run_start..upper].iter().find(|&&(_, idx)| idx < before) {
            return Some(hit);
        }
        upper = run_start;
    }
    None
}
