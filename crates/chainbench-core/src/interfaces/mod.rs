// crates/chainbench-core/src/interfaces/mod.rs
// ============================================================================
// Module: Chain-Bench Interfaces
// Description: Backend-agnostic interfaces for probing and persistence.
// Purpose: Define the capability surfaces the benchmark runtime depends on.
// Dependencies: crate::core, serde, thiserror, time
// ============================================================================

//! ## Overview
//! Interfaces define how the core integrates with the outside world without
//! embedding a specific RPC client or database. The [`Prober`] capability has
//! one method per probe kind so a real network client or a test double can be
//! substituted without touching the runtime; the [`RunStore`] capability is
//! the append-only time-series boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::BenchmarkRun;
use crate::core::ConfigSample;
use crate::core::LatencySample;
use crate::core::NodeUrl;
use crate::core::PointSample;
use crate::core::ProbeBudget;
use crate::core::ProbeKind;
use crate::core::StalenessSample;
use crate::core::ThroughputSample;

// ============================================================================
// SECTION: Probe Errors
// ============================================================================

/// Probe failure taxonomy at the execution boundary.
///
/// # Invariants
/// - Variants are stable for programmatic handling; messages are opaque.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Node unreachable or connection budget exhausted.
    #[error("connect failed: {0}")]
    Connect(String),
    /// An individual probe operation failed after connecting.
    #[error("call failed: {0}")]
    Call(String),
    /// The probe ran but the payload failed a validity check.
    #[error("invalid payload: {0}")]
    Semantic(String),
    /// The cancellation token was observed before the probe started.
    #[error("interrupted")]
    Interrupted,
}

// ============================================================================
// SECTION: Prober Capability
// ============================================================================

/// Capability for executing one kind of timed measurement against a node.
///
/// Implementations own retry and timeout enforcement within the supplied
/// budget and must never retry beyond it; the core treats retry exhaustion
/// as a single failed outcome.
pub trait Prober {
    /// Fetches node status/config once and times the access.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the node cannot be reached or the call fails.
    fn config(&self, node: &NodeUrl, budget: &ProbeBudget) -> Result<ConfigSample, ProbeError>;

    /// Counts consecutive block fetches completed within the time box.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the head height cannot be resolved.
    fn block_throughput(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
    ) -> Result<ThroughputSample, ProbeError>;

    /// Counts account-history operations retrieved within the time box.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the first history page cannot be fetched.
    fn history_throughput(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
        account: &str,
    ) -> Result<ThroughputSample, ProbeError>;

    /// Times one content lookup, with fallbacks when the target is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the lookup and all fallbacks fail.
    fn call_latency(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
        author: &str,
        permlink: &str,
    ) -> Result<PointSample, ProbeError>;

    /// Issues `samples` back-to-back lightweight queries and reports
    /// min/max/avg latency over the successful ones.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when zero calls succeed.
    fn repeated_latency(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
        samples: u32,
    ) -> Result<LatencySample, ProbeError>;

    /// Fetches head metadata once and derives head delay and lag.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the head metadata cannot be fetched or parsed.
    fn staleness(
        &self,
        node: &NodeUrl,
        budget: &ProbeBudget,
    ) -> Result<StalenessSample, ProbeError>;
}

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Run store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Store errors are fatal to persistence; a failed `record` must not leave
///   partial rows behind.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("run store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("run store corruption: {0}")]
    Corrupt(String),
    /// Store data is invalid.
    #[error("run store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("run store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: History Rows
// ============================================================================

/// Per-run node status row returned by the history query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatusRow {
    /// Node the status describes.
    pub node: NodeUrl,
    /// Run the status belongs to.
    pub run_id: i64,
    /// Timestamp of the parent run.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Whether the node was working in that run.
    pub is_working: bool,
    /// Error message recorded for a failing node.
    pub error: Option<String>,
}

/// Per-run per-probe rank row returned by the history query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRow {
    /// Node the result describes.
    pub node: NodeUrl,
    /// Run the result belongs to.
    pub run_id: i64,
    /// Timestamp of the parent run.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Probe kind the result belongs to.
    pub probe_kind: ProbeKind,
    /// Whether the probe succeeded in that run.
    pub ok: bool,
    /// Rank assigned in that run, when the probe succeeded.
    pub rank: Option<u32>,
}

/// Raw in-window rows for trend and consistency computation.
///
/// # Invariants
/// - `known_nodes` lists every node the store has ever observed, including
///   nodes with zero in-window rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRows {
    /// In-window node status rows, in run timestamp order.
    pub statuses: Vec<NodeStatusRow>,
    /// In-window rank rows, in run timestamp order.
    pub ranks: Vec<RankRow>,
    /// Every node known to the store.
    pub known_nodes: Vec<NodeUrl>,
}

// ============================================================================
// SECTION: Run Store Capability
// ============================================================================

/// Append-only time-series store for benchmark runs.
pub trait RunStore {
    /// Persists one run atomically and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails; no partial rows remain.
    fn record(&self, run: &BenchmarkRun) -> Result<i64, StoreError>;

    /// Returns the most recently timestamped run, reconstructed into the
    /// shape produced by the orchestration pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn latest(&self) -> Result<Option<BenchmarkRun>, StoreError>;

    /// Returns all status and rank rows whose parent run falls within the
    /// lookback window, plus every node known to the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn history(&self, lookback_days: i64) -> Result<HistoryRows, StoreError>;
}
