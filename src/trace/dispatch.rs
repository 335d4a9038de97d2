//! Kernel dispatch records
//!
//! A dispatch is one execution of a kernel on a queue. Rows arrive from the
//! trace collector as plain tuples; [`DispatchRecord`] is the validated form
//! consumed by the graph builder.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{LensError, LensResult};

/// Dispatch table row as supplied by the trace collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRow {
    pub id: u64,
    #[serde(alias = "kernel_id")]
    pub kernel_symbol_id: u64,
    pub queue_id: u64,
    #[serde(alias = "start")]
    pub start_ns: u64,
    #[serde(alias = "end")]
    pub end_ns: u64,
}

impl DispatchRow {
    pub fn new(id: u64, kernel_symbol_id: u64, queue_id: u64, start_ns: u64, end_ns: u64) -> Self {
        DispatchRow {
            id,
            kernel_symbol_id,
            queue_id,
            start_ns,
            end_ns,
        }
    }
}

/// Validated, immutable dispatch execution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchRecord {
    id: u64,
    queue_id: u64,
    symbol_id: u64,
    start_ns: u64,
    end_ns: u64,
}

impl DispatchRecord {
    /// Validate a single row (`end_ns >= start_ns`)
    pub fn from_row(row: &DispatchRow) -> LensResult<Self> {
        if row.end_ns < row.start_ns {
            return Err(LensError::InvalidTrace(format!(
                "dispatch {} ends before it starts ({} < {})",
                row.id, row.end_ns, row.start_ns
            )));
        }

        Ok(DispatchRecord {
            id: row.id,
            queue_id: row.queue_id,
            symbol_id: row.kernel_symbol_id,
            start_ns: row.start_ns,
            end_ns: row.end_ns,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn queue_id(&self) -> u64 {
        self.queue_id
    }

    pub fn symbol_id(&self) -> u64 {
        self.symbol_id
    }

    pub fn start_ns(&self) -> u64 {
        self.start_ns
    }

    pub fn end_ns(&self) -> u64 {
        self.end_ns
    }

    /// `end - start`, never negative
    pub fn duration_ns(&self) -> u64 {
        self.end_ns - self.start_ns
    }
}

/// Validate a dispatch table
///
/// Rejects rows ending before they start and duplicate dispatch ids. Row
/// order is preserved.
pub fn records_from_rows(rows: &[DispatchRow]) -> LensResult<Vec<DispatchRecord>> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        if !seen.insert(row.id) {
            return Err(LensError::InvalidTrace(format!(
                "duplicate dispatch id {}",
                row.id
            )));
        }
        records.push(DispatchRecord::from_row(row)?);
    }

    Ok(records)
}

/// Wall-clock span from the earliest start to the latest end
pub fn total_span_ns(records: &[DispatchRecord]) -> u64 {
    let start = records.iter().map(DispatchRecord::start_ns).min();
    let end = records.iter().map(DispatchRecord::end_ns).max();
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_sub(start),
        _ => 0,
    }
}
