// crates/chainbench-core/src/core/run.rs
// ============================================================================
// Module: Chain-Bench Run Envelope
// Description: Run parameters and the immutable per-run result envelope.
// Purpose: Capture one complete orchestration pass for reporting and persistence.
// Dependencies: serde, time, crate::core::{budget, node, record}
// ============================================================================

//! ## Overview
//! A benchmark run is assembled once at the end of an orchestration pass and
//! is immutable thereafter; the store appends it and can reconstruct the same
//! shape via `latest()`. Every observed node appears in exactly one of the
//! working records or the failing-node map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::budget::ProbeBudget;
use crate::core::node::NodeUrl;
use crate::core::record::NodeRecord;

// ============================================================================
// SECTION: Run Parameters
// ============================================================================

/// Parameters that shaped one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Retry/timeout/time-box budget applied to every probe.
    pub budget: ProbeBudget,
    /// Whether probes were dispatched on the threaded worker pool.
    pub threaded: bool,
    /// Account whose history backs the history throughput probe.
    pub history_account: String,
    /// Author of the content target for the point-query probe.
    pub call_author: String,
    /// Permlink of the content target for the point-query probe.
    pub call_permlink: String,
    /// Version of the RPC client used for probing.
    pub client_version: String,
    /// Version of the benchmark tool itself.
    pub script_version: String,
}

// ============================================================================
// SECTION: Benchmark Run
// ============================================================================

/// One complete pass of all probes across all configured nodes.
///
/// # Invariants
/// - A node appears in exactly one of `records` and `failing`.
/// - `records` is ordered by descending composite score, ties broken by
///   ascending node URL.
/// - `run_id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    /// Store-assigned run identifier, populated on persistence.
    pub run_id: Option<i64>,
    /// Moment the run was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Moment the first probe pass started.
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// Moment the last probe pass finished.
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    /// Parameters that shaped the run.
    pub parameters: RunParameters,
    /// Working nodes with ranks and composite scores.
    pub records: Vec<NodeRecord>,
    /// Nodes that failed reachability, with their first error message.
    pub failing: BTreeMap<NodeUrl, String>,
}

impl BenchmarkRun {
    /// Returns the working node URLs in report order.
    #[must_use]
    pub fn working_nodes(&self) -> Vec<&NodeUrl> {
        self.records.iter().map(|record| &record.node).collect()
    }

    /// Returns every node observed by this run, working or failing.
    #[must_use]
    pub fn observed_nodes(&self) -> Vec<&NodeUrl> {
        self.records.iter().map(|record| &record.node).chain(self.failing.keys()).collect()
    }
}
