// crates/chainbench-core/src/core/probe.rs
// ============================================================================
// Module: Chain-Bench Probe Measurements
// Description: Probe kinds, per-kind measurement payloads, and outcome envelope.
// Purpose: Replace ad hoc dictionary results with exhaustively matchable variants.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every probe returns a kind-specific measurement inside a common outcome
//! envelope (node, success flag, error string, wall-clock duration). The
//! aggregator pattern-matches the tagged measurement instead of relying on
//! best-effort key lookups, so adding a probe kind is a compile-checked
//! change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::node::NodeUrl;

// ============================================================================
// SECTION: Probe Kinds
// ============================================================================

/// The fixed set of timed measurements performed against each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Status/config retrieval latency and advertised version.
    Config,
    /// Consecutive block retrieval throughput within the time box.
    Blocks,
    /// Account history retrieval throughput within the time box.
    History,
    /// Single point-query (content lookup) latency.
    Call,
    /// Repeated lightweight query latency statistics.
    Latency,
    /// Head-of-chain staleness: head delay and irreversibility lag.
    Staleness,
}

impl ProbeKind {
    /// All probe kinds in the fixed execution order of one benchmark run.
    pub const ALL: [Self; 6] =
        [Self::Config, Self::Blocks, Self::History, Self::Call, Self::Latency, Self::Staleness];

    /// Returns the stable string label used in persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Blocks => "blocks",
            Self::History => "history",
            Self::Call => "call",
            Self::Latency => "latency",
            Self::Staleness => "staleness",
        }
    }

    /// Parses a persistence label back into a probe kind.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Probe Samples
// ============================================================================

/// Result of one status/config probe.
///
/// # Invariants
/// - A missing advertised version is recorded as `None`; it is not by itself
///   a probe failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSample {
    /// Advertised blockchain version string, when present in the payload.
    pub version: Option<String>,
    /// Seconds taken to fetch the config payload.
    pub access_time: f64,
}

/// Result of one throughput probe (blocks or account history).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputSample {
    /// Number of successful iterations completed within the time box.
    pub count: u64,
}

/// Result of one point-query latency probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSample {
    /// Seconds taken by the (possibly fallback) query that succeeded.
    pub access_time: f64,
}

/// Result of one repeated-latency probe.
///
/// # Invariants
/// - Statistics cover successful calls only; a probe with zero successful
///   calls fails instead of producing a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Minimum observed latency in seconds.
    pub min_latency: f64,
    /// Maximum observed latency in seconds.
    pub max_latency: f64,
    /// Mean observed latency in seconds.
    pub avg_latency: f64,
    /// Number of calls that succeeded and contributed to the statistics.
    pub samples_taken: u32,
}

/// Result of one staleness probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StalenessSample {
    /// Seconds between the current UTC time and the head block timestamp.
    pub head_delay: f64,
    /// Block-count gap between the head and the last irreversible block.
    pub head_lag: i64,
}

// ============================================================================
// SECTION: Measurement Variants
// ============================================================================

/// Kind-specific measurement payload carried inside a probe outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeMeasurement {
    /// Config probe payload.
    Config {
        /// Advertised blockchain version string, when present.
        version: Option<String>,
        /// Seconds taken to fetch the config payload.
        access_time: f64,
    },
    /// Throughput probe payload (blocks or history).
    Throughput {
        /// Successful iterations within the time box.
        count: u64,
    },
    /// Point-query latency payload.
    PointLatency {
        /// Seconds taken by the query that succeeded.
        access_time: f64,
    },
    /// Repeated-latency statistics payload.
    RepeatedLatency {
        /// Minimum observed latency in seconds.
        min_latency: f64,
        /// Maximum observed latency in seconds.
        max_latency: f64,
        /// Mean observed latency in seconds.
        avg_latency: f64,
        /// Number of contributing successful calls.
        samples: u32,
    },
    /// Staleness payload.
    Staleness {
        /// Seconds between now and the head block timestamp.
        head_delay: f64,
        /// Head minus last-irreversible block number.
        head_lag: i64,
    },
}

impl From<ConfigSample> for ProbeMeasurement {
    fn from(sample: ConfigSample) -> Self {
        Self::Config {
            version: sample.version,
            access_time: sample.access_time,
        }
    }
}

impl From<ThroughputSample> for ProbeMeasurement {
    fn from(sample: ThroughputSample) -> Self {
        Self::Throughput {
            count: sample.count,
        }
    }
}

impl From<PointSample> for ProbeMeasurement {
    fn from(sample: PointSample) -> Self {
        Self::PointLatency {
            access_time: sample.access_time,
        }
    }
}

impl From<LatencySample> for ProbeMeasurement {
    fn from(sample: LatencySample) -> Self {
        Self::RepeatedLatency {
            min_latency: sample.min_latency,
            max_latency: sample.max_latency,
            avg_latency: sample.avg_latency,
            samples: sample.samples_taken,
        }
    }
}

impl From<StalenessSample> for ProbeMeasurement {
    fn from(sample: StalenessSample) -> Self {
        Self::Staleness {
            head_delay: sample.head_delay,
            head_lag: sample.head_lag,
        }
    }
}

// ============================================================================
// SECTION: Outcome Envelope
// ============================================================================

/// Normalized result of executing one probe against one node.
///
/// # Invariants
/// - Exactly one outcome exists per (run, node, probe kind).
/// - `successful == true` implies `measurement.is_some()` and `error.is_none()`.
/// - `successful == false` implies `error.is_some()` with a non-empty message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Node the probe ran against.
    pub node: NodeUrl,
    /// Kind of probe that produced this outcome.
    pub probe_kind: ProbeKind,
    /// Whether the probe completed without error.
    pub successful: bool,
    /// Kind-specific measurement, present on success.
    pub measurement: Option<ProbeMeasurement>,
    /// Human-readable error message, present on failure.
    pub error: Option<String>,
    /// Total wall-clock seconds spent in the probe invocation.
    pub total_duration: f64,
}

impl ProbeOutcome {
    /// Builds a successful outcome from a measurement.
    #[must_use]
    pub fn success(
        node: NodeUrl,
        probe_kind: ProbeKind,
        measurement: ProbeMeasurement,
        total_duration: f64,
    ) -> Self {
        Self {
            node,
            probe_kind,
            successful: true,
            measurement: Some(measurement),
            error: None,
            total_duration,
        }
    }

    /// Builds a failed outcome from an error message.
    #[must_use]
    pub fn failure(
        node: NodeUrl,
        probe_kind: ProbeKind,
        error: impl Into<String>,
        total_duration: f64,
    ) -> Self {
        Self {
            node,
            probe_kind,
            successful: false,
            measurement: None,
            error: Some(error.into()),
            total_duration,
        }
    }
}

// ============================================================================
// SECTION: Metric Formatting
// ============================================================================

/// Rounds a metric to two decimal places, the precision used for every
/// latency and duration field in the data model.
#[must_use]
pub fn round2(value: f64) -> f64 {
    if value.is_finite() { (value * 100.0).round() / 100.0 } else { 0.0 }
}
