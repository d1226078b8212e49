// crates/chainbench-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Scripted prober and outcome builders shared across core tests.
// Purpose: Provide deterministic probe behavior without any network.
// Dependencies: chainbench-core
// ============================================================================

//! ## Overview
//! The scripted prober returns preloaded samples per node and fails for any
//! node it has no script for, so tests control the exact outcome mix the
//! runtime sees.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chainbench_core::ConfigSample;
use chainbench_core::LatencySample;
use chainbench_core::NodeUrl;
use chainbench_core::PointSample;
use chainbench_core::ProbeBudget;
use chainbench_core::ProbeError;
use chainbench_core::ProbeKind;
use chainbench_core::ProbeMeasurement;
use chainbench_core::ProbeOutcome;
use chainbench_core::Prober;
use chainbench_core::StalenessSample;
use chainbench_core::ThroughputSample;

// ============================================================================
// SECTION: Scripted Prober
// ============================================================================

/// Deterministic prober returning preloaded samples keyed by node URL.
#[derive(Debug, Default)]
pub struct ScriptedProber {
    /// Per-node config samples.
    pub configs: BTreeMap<String, ConfigSample>,
    /// Per-node block throughput counts.
    pub block_counts: BTreeMap<String, u64>,
    /// Per-node history throughput counts.
    pub history_counts: BTreeMap<String, u64>,
    /// Per-node point-query access times.
    pub call_times: BTreeMap<String, f64>,
    /// Per-node repeated-latency samples.
    pub latencies: BTreeMap<String, LatencySample>,
    /// Per-node staleness samples.
    pub staleness: BTreeMap<String, StalenessSample>,
    /// Nodes that fail every probe with a connect error.
    pub unreachable: BTreeSet<String>,
}

impl ScriptedProber {
    /// Adds a node that succeeds at every probe with uniform metrics.
    pub fn with_healthy_node(mut self, url: &str, count: u64, seconds: f64) -> Self {
        self.configs.insert(
            url.to_owned(),
            ConfigSample {
                version: Some("1.27.5".to_owned()),
                access_time: seconds,
            },
        );
        self.block_counts.insert(url.to_owned(), count);
        self.history_counts.insert(url.to_owned(), count);
        self.call_times.insert(url.to_owned(), seconds);
        self.latencies.insert(
            url.to_owned(),
            LatencySample {
                min_latency: seconds,
                max_latency: seconds,
                avg_latency: seconds,
                samples_taken: 5,
            },
        );
        self.staleness.insert(
            url.to_owned(),
            StalenessSample {
                head_delay: seconds,
                head_lag: 1,
            },
        );
        self
    }

    /// Adds a node that fails every probe with a connect error.
    pub fn with_unreachable_node(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_owned());
        self
    }

    /// Resolves a scripted value or the appropriate error for a node.
    fn lookup<T: Clone>(
        &self,
        table: &BTreeMap<String, T>,
        node: &NodeUrl,
    ) -> Result<T, ProbeError> {
        if self.unreachable.contains(node.as_str()) {
            return Err(ProbeError::Connect("connection refused".to_owned()));
        }
        table
            .get(node.as_str())
            .cloned()
            .ok_or_else(|| ProbeError::Call("no scripted sample".to_owned()))
    }
}

impl Prober for ScriptedProber {
    fn config(&self, node: &NodeUrl, _budget: &ProbeBudget) -> Result<ConfigSample, ProbeError> {
        self.lookup(&self.configs, node)
    }

    fn block_throughput(
        &self,
        node: &NodeUrl,
        _budget: &ProbeBudget,
    ) -> Result<ThroughputSample, ProbeError> {
        self.lookup(&self.block_counts, node).map(|count| ThroughputSample {
            count,
        })
    }

    fn history_throughput(
        &self,
        node: &NodeUrl,
        _budget: &ProbeBudget,
        _account: &str,
    ) -> Result<ThroughputSample, ProbeError> {
        self.lookup(&self.history_counts, node).map(|count| ThroughputSample {
            count,
        })
    }

    fn call_latency(
        &self,
        node: &NodeUrl,
        _budget: &ProbeBudget,
        _author: &str,
        _permlink: &str,
    ) -> Result<PointSample, ProbeError> {
        self.lookup(&self.call_times, node).map(|access_time| PointSample {
            access_time,
        })
    }

    fn repeated_latency(
        &self,
        node: &NodeUrl,
        _budget: &ProbeBudget,
        _samples: u32,
    ) -> Result<LatencySample, ProbeError> {
        self.lookup(&self.latencies, node)
    }

    fn staleness(
        &self,
        node: &NodeUrl,
        _budget: &ProbeBudget,
    ) -> Result<StalenessSample, ProbeError> {
        self.lookup(&self.staleness, node)
    }
}

// ============================================================================
// SECTION: Outcome Builders
// ============================================================================

/// Builds a successful throughput outcome.
#[must_use]
pub fn throughput_outcome(url: &str, kind: ProbeKind, count: u64, duration: f64) -> ProbeOutcome {
    ProbeOutcome::success(
        NodeUrl::new(url),
        kind,
        ProbeMeasurement::Throughput {
            count,
        },
        duration,
    )
}

/// Builds a successful config outcome with a version string.
#[must_use]
pub fn config_outcome(url: &str, version: Option<&str>, access_time: f64) -> ProbeOutcome {
    ProbeOutcome::success(
        NodeUrl::new(url),
        ProbeKind::Config,
        ProbeMeasurement::Config {
            version: version.map(str::to_owned),
            access_time,
        },
        access_time,
    )
}

/// Builds a failed outcome for one kind.
#[must_use]
pub fn failed_outcome(url: &str, kind: ProbeKind, error: &str) -> ProbeOutcome {
    ProbeOutcome::failure(NodeUrl::new(url), kind, error, 0.0)
}
